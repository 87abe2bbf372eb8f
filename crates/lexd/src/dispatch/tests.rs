//! Unit tests for frame draining and request dispatch.

use std::io::{self, Cursor, Read, Write};
use std::sync::Arc;

use mockall::mock;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use crate::codec::{FrameDecode, FrameError, MAX_HEADER_BYTES, encode, try_extract_frame};
use crate::protocol::{RequestId, RequestMessage};
use crate::registry::{Handler, HandlerError, Method, MethodRegistry};

use super::*;

mock! {
    RecordingHandler {}
    impl Handler for RecordingHandler {
        fn handle(&self, request: &RequestMessage) -> Result<Value, HandlerError>;
    }
}

fn echo(request: &RequestMessage) -> Result<Value, HandlerError> {
    Ok(json!({"method": request.method, "params": request.params}))
}

fn shutdown(_: &RequestMessage) -> Result<Value, HandlerError> {
    Ok(Value::Null)
}

fn frame(payload: &str) -> Vec<u8> {
    encode(payload.as_bytes())
}

/// Decodes every framed response in `output`.
fn responses(output: &[u8]) -> Vec<Value> {
    let mut buffer = output.to_vec();
    let mut values = Vec::new();
    while let FrameDecode::Frame(frame) = try_extract_frame(&mut buffer, usize::MAX) {
        values.push(serde_json::from_slice(frame.payload()).expect("response is JSON"));
    }
    assert!(buffer.is_empty(), "output holds a partial frame");
    values
}

fn feed_chunks(dispatcher: &mut Dispatcher, chunks: &[&[u8]]) -> (Vec<DispatchResult>, Vec<u8>) {
    let mut writer = ResponseWriter::new(Vec::new());
    let mut results = Vec::new();
    for chunk in chunks {
        results.extend(dispatcher.feed(chunk, &mut writer).expect("feed succeeds"));
    }
    (results, writer.into_inner())
}

fn dispatcher_with(registry: MethodRegistry, limit: usize) -> Dispatcher {
    Dispatcher::new(Arc::new(registry), limit)
}

fn default_dispatcher() -> Dispatcher {
    let registry = MethodRegistry::builder()
        .register(Method::Initialize, echo)
        .register(Method::Shutdown, shutdown)
        .build();
    dispatcher_with(registry, 1024)
}

#[fixture]
fn dispatcher() -> Dispatcher {
    default_dispatcher()
}

#[rstest]
fn answers_with_the_request_id(mut dispatcher: Dispatcher) {
    let input = frame(r#"{"id":"abc","method":"initialize","params":{"x":1}}"#);

    let (results, output) = feed_chunks(&mut dispatcher, &[input.as_slice()]);

    assert!(matches!(
        results.as_slice(),
        [DispatchResult::Dispatched { id, method: Method::Initialize, .. }]
            if *id == RequestId::from("abc")
    ));
    assert_eq!(
        responses(&output),
        vec![json!({
            "id": "abc",
            "result": {"method": "initialize", "params": {"x": 1}}
        })]
    );
}

#[rstest]
#[case::beyond_i64("18446744073709551615", json!(u64::MAX))]
#[case::exponent("1e3", json!(1000.0))]
#[case::fraction("1.5", json!(1.5))]
fn answers_requests_with_any_numeric_id(
    mut dispatcher: Dispatcher,
    #[case] literal: &str,
    #[case] expected: Value,
) {
    let input = frame(&format!(r#"{{"id":{literal},"method":"shutdown"}}"#));

    let (results, output) = feed_chunks(&mut dispatcher, &[input.as_slice()]);

    assert!(results.iter().all(DispatchResult::is_dispatched));
    assert_eq!(
        responses(&output),
        vec![json!({"id": expected, "result": null})]
    );
}

#[rstest]
fn reports_written_bytes(mut dispatcher: Dispatcher) {
    let input = frame(r#"{"id":1,"method":"shutdown"}"#);

    let (results, output) = feed_chunks(&mut dispatcher, &[input.as_slice()]);

    let [DispatchResult::Dispatched { bytes, .. }] = results.as_slice() else {
        panic!("expected one dispatch, got {results:?}");
    };
    assert_eq!(*bytes, output.len());
}

#[rstest]
fn drains_every_frame_of_a_chunk_in_order(mut dispatcher: Dispatcher) {
    let mut input = frame(r#"{"id":1,"method":"initialize"}"#);
    input.extend(frame(r#"{"id":2,"method":"shutdown"}"#));

    let (results, output) = feed_chunks(&mut dispatcher, &[input.as_slice()]);

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(DispatchResult::is_dispatched));
    let ids: Vec<Value> = responses(&output)
        .into_iter()
        .map(|response| response["id"].clone())
        .collect();
    assert_eq!(ids, vec![json!(1), json!(2)]);
    assert!(dispatcher.buffer().is_empty());
}

#[rstest]
fn any_split_point_produces_the_same_dispatch() {
    let input = frame(r#"{"id":"split","method":"initialize","params":[1,2,3]}"#);
    let (_, expected) = feed_chunks(&mut default_dispatcher(), &[input.as_slice()]);

    for split in 0..=input.len() {
        let mut fresh = default_dispatcher();
        let (head, tail) = input.split_at(split);

        let (results, output) = feed_chunks(&mut fresh, &[head, tail]);

        assert_eq!(results.len(), 1, "split at {split}");
        assert!(results[0].is_dispatched(), "split at {split}");
        assert_eq!(output, expected, "split at {split}");
    }
}

#[rstest]
fn partial_payload_waits_for_the_rest(mut dispatcher: Dispatcher) {
    let prefix = r#"{"id":1,"method":"shutdown","params":""#;
    let suffix = r#""}"#;
    let payload = format!(
        "{prefix}{}{suffix}",
        "x".repeat(100 - prefix.len() - suffix.len())
    );
    assert_eq!(payload.len(), 100);
    let input = frame(&payload);
    let header_len = input.len() - 100;
    let (first, rest) = input.split_at(header_len + 40);
    let mut writer = ResponseWriter::new(Vec::new());

    let early = dispatcher.feed(first, &mut writer).expect("feed succeeds");
    assert!(early.is_empty());
    assert!(writer.get_ref().is_empty());
    assert_eq!(rest.len(), 60);

    let late = dispatcher.feed(rest, &mut writer).expect("feed succeeds");
    assert_eq!(late.len(), 1);
    assert_eq!(
        responses(writer.get_ref()),
        vec![json!({"id": 1, "result": null})]
    );
}

#[rstest]
#[case::unregistered_known_method("textDocument/completion")]
#[case::unknown_method("workspace/symbol")]
fn unknown_methods_produce_no_output(mut dispatcher: Dispatcher, #[case] method: &str) {
    let input = frame(&format!(r#"{{"id":5,"method":"{method}"}}"#));

    let (results, output) = feed_chunks(&mut dispatcher, &[input.as_slice()]);

    assert!(output.is_empty());
    assert!(matches!(
        results.as_slice(),
        [DispatchResult::Dropped(DropReason::UnknownMethod { method: dropped, .. })]
            if dropped == method
    ));
}

#[rstest]
#[case::truncated_json(r#"{"id":1,"#)]
#[case::not_an_object("[1,2]")]
#[case::missing_method(r#"{"id":1}"#)]
#[case::empty("")]
fn undecodable_payloads_do_not_stop_later_frames(mut dispatcher: Dispatcher, #[case] bad: &str) {
    let mut input = frame(bad);
    input.extend(frame(r#"{"id":2,"method":"shutdown"}"#));

    let (results, output) = feed_chunks(&mut dispatcher, &[input.as_slice()]);

    assert!(matches!(
        results.as_slice(),
        [
            DispatchResult::Dropped(DropReason::MalformedPayload(_)),
            DispatchResult::Dispatched { .. },
        ]
    ));
    assert_eq!(responses(&output), vec![json!({"id": 2, "result": null})]);
}

#[rstest]
fn handler_errors_are_dropped_silently() {
    let mut failing = MockRecordingHandler::new();
    failing
        .expect_handle()
        .times(1)
        .returning(|_| Err(HandlerError::failed("no candidates")));
    let registry = MethodRegistry::builder()
        .register(Method::Completion, failing)
        .register(Method::Shutdown, shutdown)
        .build();
    let mut dispatcher = dispatcher_with(registry, 1024);
    let mut input = frame(r#"{"id":1,"method":"textDocument/completion"}"#);
    input.extend(frame(r#"{"id":2,"method":"shutdown"}"#));

    let (results, output) = feed_chunks(&mut dispatcher, &[input.as_slice()]);

    assert!(matches!(
        results.as_slice(),
        [
            DispatchResult::Dropped(DropReason::HandlerFailed {
                method: Method::Completion,
                error: HandlerError::Failed { .. },
                ..
            }),
            DispatchResult::Dispatched { .. },
        ]
    ));
    assert_eq!(responses(&output), vec![json!({"id": 2, "result": null})]);
}

#[rstest]
fn handler_panics_are_contained() {
    let registry = MethodRegistry::builder()
        .register(
            Method::Initialize,
            |_: &RequestMessage| -> Result<Value, HandlerError> { panic!("exploded") },
        )
        .register(Method::Shutdown, shutdown)
        .build();
    let mut dispatcher = dispatcher_with(registry, 1024);
    let mut input = frame(r#"{"id":1,"method":"initialize"}"#);
    input.extend(frame(r#"{"id":2,"method":"shutdown"}"#));

    let (results, output) = feed_chunks(&mut dispatcher, &[input.as_slice()]);

    let [
        DispatchResult::Dropped(DropReason::HandlerFailed {
            error: HandlerError::Panicked { message },
            ..
        }),
        DispatchResult::Dispatched { .. },
    ] = results.as_slice()
    else {
        panic!("unexpected results: {results:?}");
    };
    assert_eq!(message, "exploded");
    assert_eq!(responses(&output), vec![json!({"id": 2, "result": null})]);
}

#[rstest]
fn handlers_receive_the_decoded_request() {
    let mut handler = MockRecordingHandler::new();
    handler
        .expect_handle()
        .withf(|request| {
            request.id == RequestId::from(4_i64)
                && request.params == Some(json!({"textDocument": {"uri": "file:///a"}}))
        })
        .times(1)
        .returning(|_| Ok(json!({"isIncomplete": false, "items": []})));
    let registry = MethodRegistry::builder()
        .register(Method::Completion, handler)
        .build();
    let mut dispatcher = dispatcher_with(registry, 1024);
    let input = frame(
        r#"{"jsonrpc":"2.0","id":4,"method":"textDocument/completion","params":{"textDocument":{"uri":"file:///a"}}}"#,
    );

    let (results, output) = feed_chunks(&mut dispatcher, &[input.as_slice()]);

    assert_eq!(results.len(), 1);
    assert_eq!(
        responses(&output),
        vec![json!({"id": 4, "result": {"isIncomplete": false, "items": []}})]
    );
}

#[rstest]
fn header_blocks_without_length_are_discarded(mut dispatcher: Dispatcher) {
    let mut input = b"Content-Type: application/json\r\n\r\n".to_vec();
    input.extend(frame(r#"{"id":3,"method":"shutdown"}"#));

    let (results, output) = feed_chunks(&mut dispatcher, &[input.as_slice()]);

    assert!(matches!(
        results.as_slice(),
        [
            DispatchResult::Dropped(DropReason::MalformedFrame(FrameError::MissingContentLength)),
            DispatchResult::Dispatched { .. },
        ]
    ));
    assert_eq!(responses(&output), vec![json!({"id": 3, "result": null})]);
}

#[rstest]
fn stray_byte_does_not_hide_later_frames(mut dispatcher: Dispatcher) {
    let mut input = b"x".to_vec();
    for id in 1..=3 {
        input.extend(frame(&format!(r#"{{"id":{id},"method":"shutdown"}}"#)));
    }

    let (results, output) = feed_chunks(&mut dispatcher, &[input.as_slice()]);

    assert!(matches!(
        results.as_slice(),
        [
            DispatchResult::Dropped(DropReason::MalformedFrame(FrameError::UnexpectedBytes {
                len: 1
            })),
            DispatchResult::Dispatched { .. },
            DispatchResult::Dispatched { .. },
            DispatchResult::Dispatched { .. },
        ]
    ));
    let ids: Vec<Value> = responses(&output)
        .into_iter()
        .map(|response| response["id"].clone())
        .collect();
    assert_eq!(ids, vec![json!(1), json!(2), json!(3)]);
}

#[rstest]
fn invalid_length_does_not_hide_later_frames(mut dispatcher: Dispatcher) {
    let mut input = b"Content-Length: 5x\r\n\r\nhello".to_vec();
    input.extend(frame(r#"{"id":1,"method":"shutdown"}"#));
    input.extend(frame(r#"{"id":2,"method":"shutdown"}"#));

    let (results, output) = feed_chunks(&mut dispatcher, &[input.as_slice()]);

    assert_eq!(results.iter().filter(|result| result.is_dispatched()).count(), 2);
    assert_eq!(
        responses(&output),
        vec![json!({"id": 1, "result": null}), json!({"id": 2, "result": null})]
    );
}

#[rstest]
fn headerless_input_is_dropped_in_bounded_steps(mut dispatcher: Dispatcher) {
    let junk = vec![b'z'; 64 * 1024];
    let mut writer = ResponseWriter::new(Vec::new());

    for _ in 0..64 {
        dispatcher.feed(&junk, &mut writer).expect("feed succeeds");
        assert!(dispatcher.buffer().len() <= MAX_HEADER_BYTES);
    }
    let results = dispatcher
        .feed(&frame(r#"{"id":8,"method":"shutdown"}"#), &mut writer)
        .expect("feed succeeds");

    assert!(results.last().is_some_and(DispatchResult::is_dispatched));
    assert_eq!(
        responses(writer.get_ref()),
        vec![json!({"id": 8, "result": null})]
    );
}

#[rstest]
fn oversized_frames_are_skipped_across_chunks() {
    let registry = MethodRegistry::builder()
        .register(Method::Shutdown, shutdown)
        .build();
    let mut dispatcher = dispatcher_with(registry, 32);
    let oversized = frame(&"x".repeat(64));
    let (head, tail) = oversized.split_at(oversized.len() - 50);
    let mut rest = tail.to_vec();
    rest.extend(frame(r#"{"id":9,"method":"shutdown"}"#));

    let (results, output) = feed_chunks(&mut dispatcher, &[head, rest.as_slice()]);

    assert!(matches!(
        results.as_slice(),
        [
            DispatchResult::Dropped(DropReason::OversizedFrame {
                declared: 64,
                limit: 32
            }),
            DispatchResult::Dispatched { .. },
        ]
    ));
    assert_eq!(responses(&output), vec![json!({"id": 9, "result": null})]);
}

#[rstest]
fn serve_runs_until_end_of_input(mut dispatcher: Dispatcher) {
    let mut input = frame(r#"{"id":1,"method":"initialize"}"#);
    input.extend(frame(r#"{"id":2,"method":"workspace/symbol"}"#));
    input.extend(frame(r#"{"id":3,"method":"shutdown"}"#));
    input.extend(b"Content-Length: 10\r\n\r\n{\"id\"");
    let mut reader = Cursor::new(input);
    let mut writer = ResponseWriter::new(Vec::new());

    let summary = dispatcher
        .serve(&mut reader, &mut writer, 3)
        .expect("serve succeeds");

    assert_eq!(
        summary,
        SessionSummary {
            dispatched: 2,
            dropped: 1,
            unconsumed_bytes: 27,
        }
    );
    assert_eq!(responses(writer.get_ref()).len(), 2);
}

/// Yields one interruption before delegating to the inner reader.
struct InterruptOnce<R> {
    interrupted: bool,
    inner: R,
}

impl<R: Read> Read for InterruptOnce<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.interrupted {
            self.interrupted = true;
            return Err(io::Error::from(io::ErrorKind::Interrupted));
        }
        self.inner.read(buf)
    }
}

#[rstest]
fn serve_retries_interrupted_reads(mut dispatcher: Dispatcher) {
    let mut reader = InterruptOnce {
        interrupted: false,
        inner: Cursor::new(frame(r#"{"id":1,"method":"shutdown"}"#)),
    };
    let mut writer = ResponseWriter::new(Vec::new());

    let summary = dispatcher
        .serve(&mut reader, &mut writer, 64)
        .expect("serve succeeds");

    assert_eq!(summary.dispatched, 1);
}

struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::other("stdin closed abruptly"))
    }
}

#[rstest]
fn serve_fails_on_read_errors(mut dispatcher: Dispatcher) {
    let mut writer = ResponseWriter::new(Vec::new());

    let error = dispatcher
        .serve(&mut FailingReader, &mut writer, 64)
        .expect_err("read failure ends the session");

    assert!(matches!(error, DispatchError::Io(_)));
}

struct ClosedPipe;

impl Write for ClosedPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::from(io::ErrorKind::BrokenPipe))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[rstest]
fn feed_fails_when_responses_cannot_be_written(mut dispatcher: Dispatcher) {
    let mut writer = ResponseWriter::new(ClosedPipe);
    let input = frame(r#"{"id":1,"method":"shutdown"}"#);

    let error = dispatcher
        .feed(&input, &mut writer)
        .expect_err("write failure ends the session");

    assert!(matches!(error, DispatchError::Io(_)));
}

#[rstest]
fn silent_drops_write_nothing_even_when_output_is_closed(mut dispatcher: Dispatcher) {
    let mut writer = ResponseWriter::new(ClosedPipe);
    let input = frame(r#"{"id":1,"method":"workspace/symbol"}"#);

    let results = dispatcher.feed(&input, &mut writer).expect("nothing written");

    assert_eq!(results.len(), 1);
    assert!(!results[0].is_dispatched());
}
