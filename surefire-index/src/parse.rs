// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Streaming reader for JUnit/Surefire XML reports.
//!
//! [`ReportStreamParser`] pulls XML events one at a time from the underlying reader and turns them
//! into [`ReportEvent`]s. Only the test case currently being read is held in memory, so reports of
//! any size can be processed.
//!
//! Both per-class reports (a `<testsuite>` root, as written to `TEST-*.xml`) and aggregated reports
//! (a `<testsuites>` root, as written to `TESTS-*.xml`) are accepted. Suites may nest.

use crate::{
    errors::{MalformedReportError, MalformedReportErrorKind, ReportOpenError},
    report::{TestCaseResult, TestStatus},
};
use camino::Utf8PathBuf;
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use std::{
    borrow::Cow,
    collections::VecDeque,
    fs::File,
    io::{BufRead, BufReader},
    iter::FusedIterator,
    time::Duration,
};

static TESTSUITES_TAG: &[u8] = b"testsuites";
static TESTSUITE_TAG: &[u8] = b"testsuite";
static TESTCASE_TAG: &[u8] = b"testcase";
static SKIPPED_TAG: &[u8] = b"skipped";
static FAILURE_TAG: &[u8] = b"failure";
static ERROR_TAG: &[u8] = b"error";

/// An event read from a test report.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReportEvent {
    /// A `<testsuite>` element was opened.
    SuiteStarted {
        /// The `name` attribute of the suite, if present.
        name: Option<String>,
    },

    /// A `<testcase>` element was read in full.
    TestCase(TestCaseResult),

    /// The most recently opened `<testsuite>` element was closed.
    SuiteFinished,
}

/// A lazy, pull-based parser over a single report.
///
/// Yields `Ok(event)` for each event in document order. On the first problem, yields a single
/// [`MalformedReportError`] and then ends. A report that parses without errors but contains no
/// test cases simply yields no [`ReportEvent::TestCase`] events.
pub struct ReportStreamParser<R> {
    reader: Reader<R>,
    path: Utf8PathBuf,
    buf: Vec<u8>,
    state: ParseState,
    done: bool,
}

impl ReportStreamParser<BufReader<File>> {
    /// Opens the report at `path` for streaming.
    pub fn from_path(path: impl Into<Utf8PathBuf>) -> Result<Self, ReportOpenError> {
        let path = path.into();
        let file = File::open(&path).map_err(|err| ReportOpenError::new(path.clone(), err))?;
        Ok(Self::new(BufReader::new(file), path))
    }
}

impl<R: BufRead> ReportStreamParser<R> {
    /// Creates a new parser over `reader`.
    ///
    /// `path` is only used to identify the report in errors.
    pub fn new(reader: R, path: impl Into<Utf8PathBuf>) -> Self {
        let mut reader = Reader::from_reader(reader);
        reader.config_mut().trim_text(true);
        Self {
            reader,
            path: path.into(),
            buf: Vec::new(),
            state: ParseState::default(),
            done: false,
        }
    }

    fn next_event(&mut self) -> Result<Option<ReportEvent>, MalformedReportErrorKind> {
        loop {
            if let Some(event) = self.state.queue.pop_front() {
                return Ok(Some(event));
            }

            self.buf.clear();
            match self
                .reader
                .read_event_into(&mut self.buf)
                .map_err(MalformedReportErrorKind::Xml)?
            {
                Event::Start(start) => self.state.handle_start(&start)?,
                Event::Empty(start) => {
                    self.state.handle_start(&start)?;
                    self.state.handle_end()?;
                }
                Event::End(_) => self.state.handle_end()?,
                Event::Text(text) => {
                    // Whitespace-only text is trimmed away by the reader.
                    if self.state.depth == 0 {
                        return Err(MalformedReportErrorKind::TextOutsideRoot);
                    }
                    let text = text.unescape().map_err(MalformedReportErrorKind::Xml)?;
                    if self.state.is_capturing_text() {
                        self.state.push_text(&text);
                    }
                }
                Event::CData(cdata) => {
                    if self.state.depth == 0 {
                        return Err(MalformedReportErrorKind::TextOutsideRoot);
                    }
                    if self.state.is_capturing_text() {
                        self.state.push_text(&String::from_utf8_lossy(&cdata));
                    }
                }
                Event::Eof => {
                    self.state.finish()?;
                    return Ok(None);
                }
                _ => {}
            }
        }
    }

    fn byte_position(&self) -> u64 {
        u64::try_from(self.reader.buffer_position()).unwrap_or(u64::MAX)
    }
}

impl<R: BufRead> Iterator for ReportStreamParser<R> {
    type Item = Result<ReportEvent, MalformedReportError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_event() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(kind) => {
                self.done = true;
                Some(Err(MalformedReportError::new(
                    self.path.clone(),
                    self.byte_position(),
                    kind,
                )))
            }
        }
    }
}

impl<R: BufRead> FusedIterator for ReportStreamParser<R> {}

#[derive(Debug, Default)]
struct ParseState {
    // Number of currently open elements.
    depth: usize,
    seen_root: bool,
    suites: Vec<SuiteFrame>,
    current: Option<PendingTestCase>,
    queue: VecDeque<ReportEvent>,
}

#[derive(Debug)]
struct SuiteFrame {
    name: Option<String>,
    depth: usize,
}

impl ParseState {
    fn handle_start(&mut self, start: &BytesStart<'_>) -> Result<(), MalformedReportErrorKind> {
        let local_name = start.local_name();
        let tag = local_name.as_ref();

        if self.depth == 0 {
            if self.seen_root {
                return Err(MalformedReportErrorKind::MultipleRoots);
            }
            if tag != TESTSUITES_TAG && tag != TESTSUITE_TAG {
                return Err(MalformedReportErrorKind::UnexpectedRoot {
                    name: String::from_utf8_lossy(tag).into_owned(),
                });
            }
            self.seen_root = true;
        }
        self.depth += 1;

        if let Some(case) = &mut self.current {
            // Only direct children of a test case can decide its status, and only the first one.
            if case.status.is_none() && self.depth == case.depth + 1 {
                if let Some(status) = marker_status(tag) {
                    case.status = Some(status);
                    case.message = optional_attr(start, "message")?;
                    case.marker_depth = Some(self.depth);
                }
            }
            return Ok(());
        }

        if tag == TESTSUITE_TAG {
            let name = optional_attr(start, "name")?;
            self.suites.push(SuiteFrame {
                name: name.clone(),
                depth: self.depth,
            });
            self.queue.push_back(ReportEvent::SuiteStarted { name });
        } else if tag == TESTCASE_TAG {
            self.current = Some(PendingTestCase::new(start, self.depth)?);
        }

        Ok(())
    }

    fn handle_end(&mut self) -> Result<(), MalformedReportErrorKind> {
        let depth = self.depth;
        // The reader rejects end tags that don't match an open element.
        self.depth = self.depth.saturating_sub(1);

        match self.current.take() {
            Some(case) if case.depth == depth => {
                let result = case.finish(self.enclosing_suite_name())?;
                self.queue.push_back(ReportEvent::TestCase(result));
                return Ok(());
            }
            Some(mut case) => {
                if case.marker_depth == Some(depth) {
                    case.marker_depth = None;
                }
                self.current = Some(case);
                return Ok(());
            }
            None => {}
        }

        if self.suites.last().is_some_and(|suite| suite.depth == depth) {
            self.suites.pop();
            self.queue.push_back(ReportEvent::SuiteFinished);
        }
        Ok(())
    }

    fn is_capturing_text(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|case| case.marker_depth.is_some())
    }

    fn push_text(&mut self, text: &str) {
        if let Some(case) = &mut self.current {
            case.text.push_str(text);
        }
    }

    fn enclosing_suite_name(&self) -> Option<&str> {
        self.suites
            .iter()
            .rev()
            .find_map(|suite| suite.name.as_deref().filter(|name| !name.trim().is_empty()))
    }

    fn finish(&self) -> Result<(), MalformedReportErrorKind> {
        if !self.seen_root {
            return Err(MalformedReportErrorKind::NoRootElement);
        }
        if self.depth > 0 {
            return Err(MalformedReportErrorKind::UnexpectedEof {
                open_elements: self.depth,
            });
        }
        Ok(())
    }
}

#[derive(Debug)]
struct PendingTestCase {
    depth: usize,
    classname: Option<String>,
    name: String,
    duration: Duration,
    status: Option<TestStatus>,
    message: Option<String>,
    // Depth of the status marker whose text is being captured.
    marker_depth: Option<usize>,
    text: String,
}

impl PendingTestCase {
    fn new(start: &BytesStart<'_>, depth: usize) -> Result<Self, MalformedReportErrorKind> {
        let name = optional_attr(start, "name")?.ok_or(
            MalformedReportErrorKind::MissingAttribute {
                element: "testcase",
                attribute: "name",
            },
        )?;
        let time = optional_attr(start, "time")?;
        let duration = parse_time(&name, time.as_deref())?;

        Ok(Self {
            depth,
            classname: optional_attr(start, "classname")?,
            name,
            duration,
            status: None,
            message: None,
            marker_depth: None,
            text: String::new(),
        })
    }

    fn finish(self, suite_name: Option<&str>) -> Result<TestCaseResult, MalformedReportErrorKind> {
        let classname = class_identity(self.classname.as_deref(), suite_name).ok_or(
            MalformedReportErrorKind::MissingAttribute {
                element: "testcase",
                attribute: "classname",
            },
        )?;
        let status = self.status.unwrap_or(TestStatus::Passed);

        let mut result = TestCaseResult::new(classname, self.name, status);
        // Surefire reports bogus times for skipped tests.
        if status != TestStatus::Skipped {
            result.set_duration(self.duration);
        }
        if let Some(message) = self.message {
            result.set_message(message);
        }
        let text = self.text.trim();
        if !text.is_empty() {
            result.set_stack_trace(text);
        }
        Ok(result)
    }
}

fn marker_status(tag: &[u8]) -> Option<TestStatus> {
    // Rerun markers such as `flakyFailure` or `rerunError` never decide the status: a test that
    // failed all of its reruns also has a regular `<failure>` or `<error>` element.
    if tag == SKIPPED_TAG {
        Some(TestStatus::Skipped)
    } else if tag == FAILURE_TAG {
        Some(TestStatus::Failure)
    } else if tag == ERROR_TAG {
        Some(TestStatus::Error)
    } else {
        None
    }
}

fn optional_attr(
    start: &BytesStart<'_>,
    attr: &'static str,
) -> Result<Option<String>, MalformedReportErrorKind> {
    let invalid = |message: String| MalformedReportErrorKind::InvalidAttribute {
        element: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
        message,
    };

    let Some(attribute) = start
        .try_get_attribute(attr)
        .map_err(|err| invalid(err.to_string()))?
    else {
        return Ok(None);
    };
    let value = attribute
        .unescape_value()
        .map_err(|err| invalid(format!("{attr}: {err}")))?;
    Ok(Some(value.into_owned()))
}

/// Resolves the class identity of a test case.
///
/// A parameter list at the end of the classname (`Foo(Bar)`) is dropped. A blank classname falls
/// back to the name of the enclosing suite.
fn class_identity(classname: Option<&str>, suite_name: Option<&str>) -> Option<String> {
    let classname = classname.map(|classname| match classname.find('(') {
        Some(idx) if classname.ends_with(')') => &classname[..idx],
        _ => classname,
    });
    classname
        .filter(|classname| !classname.trim().is_empty())
        .or(suite_name)
        .map(str::to_owned)
}

/// Parses a `time` attribute in seconds into whole milliseconds.
///
/// The value is read with English conventions: `,` groups digits and `.` is the decimal point.
/// Missing, blank, negative and non-finite values are treated as zero.
fn parse_time(name: &str, input: Option<&str>) -> Result<Duration, MalformedReportErrorKind> {
    let Some(input) = input.map(str::trim).filter(|input| !input.is_empty()) else {
        return Ok(Duration::ZERO);
    };

    let normalized = if input.contains(',') {
        Cow::Owned(input.replace(',', ""))
    } else {
        Cow::Borrowed(input)
    };
    let secs: f64 = normalized
        .parse()
        .map_err(|_| MalformedReportErrorKind::InvalidTime {
            name: name.to_owned(),
            input: input.to_owned(),
        })?;
    if !secs.is_finite() || secs <= 0.0 {
        return Ok(Duration::ZERO);
    }

    // Round to microseconds first so that values like 0.0009999 become 1ms, then truncate.
    let millis = ((secs * 1_000_000.0).round() / 1000.0).trunc();
    Ok(Duration::from_millis(millis as u64))
}
