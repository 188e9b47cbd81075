// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serialize per-test details for a class.
//!
//! The format is a flat `<tests-details>` document with one `<testcase>` element per test:
//!
//! ```xml
//! <tests-details><testcase status="ok" time="12" name="test_add"/></tests-details>
//! ```

use crate::{
    errors::SerializeDetailsError,
    report::{TestCaseResult, TestStatus},
};
use quick_xml::{
    Writer,
    events::{BytesEnd, BytesStart, BytesText, Event},
};

static TESTS_DETAILS_TAG: &str = "tests-details";
static TESTCASE_TAG: &str = "testcase";

pub(crate) fn serialize_details(results: &[TestCaseResult]) -> Result<String, SerializeDetailsError> {
    let mut writer = Writer::new(Vec::new());

    write_event(&mut writer, Event::Start(BytesStart::new(TESTS_DETAILS_TAG)))?;
    for result in results {
        serialize_result(result, &mut writer)?;
    }
    write_event(&mut writer, Event::End(BytesEnd::new(TESTS_DETAILS_TAG)))?;

    String::from_utf8(writer.into_inner()).map_err(SerializeDetailsError::new)
}

fn serialize_result(
    result: &TestCaseResult,
    writer: &mut Writer<Vec<u8>>,
) -> Result<(), SerializeDetailsError> {
    // Use the destructuring syntax to ensure that all fields are handled.
    let TestCaseResult {
        classname: _,
        name,
        status,
        duration,
        message,
        stack_trace,
    } = result;

    let mut tag = BytesStart::new(TESTCASE_TAG);
    tag.push_attribute(("status", status.details_str()));
    tag.push_attribute(("time", duration.as_millis().to_string().as_str()));
    tag.push_attribute(("name", name.as_str()));

    // Messages and stack traces are only meaningful for tests that didn't pass.
    if *status == TestStatus::Passed {
        return write_event(writer, Event::Empty(tag));
    }
    if let Some(message) = message {
        tag.push_attribute(("message", message.as_str()));
    }

    match stack_trace {
        Some(stack_trace) => {
            write_event(writer, Event::Start(tag))?;
            write_event(writer, Event::Text(BytesText::new(stack_trace)))?;
            write_event(writer, Event::End(BytesEnd::new(TESTCASE_TAG)))
        }
        None => write_event(writer, Event::Empty(tag)),
    }
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), SerializeDetailsError> {
    writer.write_event(event).map_err(SerializeDetailsError::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    #[test]
    fn empty_details() {
        assert_eq!(
            serialize_details(&[]).unwrap(),
            "<tests-details></tests-details>"
        );
    }

    #[test]
    fn details_for_mixed_results() {
        let mut passed = TestCaseResult::new("Foo", "test_ok", TestStatus::Passed);
        passed
            .set_duration(Duration::from_millis(12))
            // Ignored for passing tests.
            .set_message("unused");

        let mut failed = TestCaseResult::new("Foo", "test_bad", TestStatus::Failure);
        failed
            .set_duration(Duration::from_millis(3))
            .set_message("expected <1> & got <2>")
            .set_stack_trace("at Foo.test_bad(Foo.pas:10)");

        let mut skipped = TestCaseResult::new("Foo", "test_later", TestStatus::Skipped);
        skipped.set_message("not ready");

        let details = serialize_details(&[passed, failed, skipped]).unwrap();
        assert_eq!(
            details,
            "<tests-details>\
             <testcase status=\"ok\" time=\"12\" name=\"test_ok\"/>\
             <testcase status=\"failure\" time=\"3\" name=\"test_bad\" \
             message=\"expected &lt;1&gt; &amp; got &lt;2&gt;\">at Foo.test_bad(Foo.pas:10)</testcase>\
             <testcase status=\"skipped\" time=\"0\" name=\"test_later\" message=\"not ready\"/>\
             </tests-details>",
        );
    }
}
