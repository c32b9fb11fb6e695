// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end tests: raw OBJ text through the dispatcher.

use std::cell::RefCell;
use std::io::{self, Read};
use std::rc::Rc;

use obj_lite_core::{
    Diagnostic, DiagnosticKind, Dispatcher, Element, ElementType, Face, FnSink, Item, Normal,
    ParserConfig, Record, Registry, TextureVertex, TokenKind, Tokenizer, Value, Vertex,
};

/// Parse `input` completely, collecting successful records and diagnostics.
fn parse_all(input: &str) -> (Vec<(ElementType, Record)>, Vec<Diagnostic>) {
    parse_with(input, ParserConfig::default())
}

fn parse_with(input: &str, config: ParserConfig) -> (Vec<(ElementType, Record)>, Vec<Diagnostic>) {
    let registry = Registry::standard().expect("standard registry");
    let mut dispatcher = Dispatcher::with_config(input.as_bytes(), registry, Vec::new(), config);
    let mut records = Vec::new();
    loop {
        match dispatcher.next() {
            Item::EndOfFile => break,
            Item::Element {
                element_type,
                outcome,
            } => {
                let record = outcome.record().expect("returned items carry a record");
                records.push((element_type, record.clone()));
            }
        }
    }
    (records, dispatcher.into_sink())
}

#[test]
fn vertex_round_trip() {
    let (records, diagnostics) = parse_all("v 1.5 -2 300.25\nv 0 0 0 1\n");
    assert!(diagnostics.is_empty());
    assert_eq!(records.len(), 2);

    let v = Vertex::from_record(&records[0].1).unwrap();
    assert_eq!(
        v,
        Vertex {
            x: 1.5,
            y: -2.0,
            z: 300.25,
            w: 0.0
        }
    );
    let v = Vertex::from_record(&records[1].1).unwrap();
    assert_eq!(v.w, 1.0);
}

#[test]
fn bad_lines_do_not_stop_the_stream() {
    let n = 25;
    let mut input = String::new();
    for i in 0..n {
        input.push_str("v 1 2\n");
        input.push_str(&format!("v {} 0 0\n", i));
    }

    let registry = Registry::standard().unwrap();
    let mut dispatcher = Dispatcher::with_sink(input.as_bytes(), registry, Vec::new());
    let mut seen = 0;
    while let Item::Element { outcome, .. } = dispatcher.next() {
        assert!(outcome.is_success());
        seen += 1;
    }
    assert_eq!(seen, n);
    assert!(dispatcher.next().is_end_of_file());
    assert_eq!(dispatcher.stats().errors, n);
    assert_eq!(dispatcher.sink().len(), n);
    for (i, d) in dispatcher.sink().iter().enumerate() {
        assert_eq!(d.kind, DiagnosticKind::SyntaxError);
        assert_eq!(d.line, 2 * i);
        assert_eq!(d.message, "parameter Z coordinate is not specified");
    }
}

#[test]
fn tokenization_is_lossless() {
    let input = "# cube\r\nv 1.0 -2 3\t0.5\nf 1/2/3 4//6 7/8\n\no cube_1 $\n#";
    let config = ParserConfig::default().with_skip_comments(false).with_chunk_size(3);
    let mut tokenizer = Tokenizer::with_config(input.as_bytes(), &config);
    let mut rebuilt = Vec::new();
    loop {
        let token = tokenizer.next_token();
        if token.kind == TokenKind::Eof {
            break;
        }
        assert!(!token.is_empty());
        rebuilt.extend_from_slice(token.bytes());
    }
    assert_eq!(rebuilt, input.as_bytes());
}

#[test]
fn face_format_must_match_first_vertex() {
    let (records, diagnostics) = parse_all("f 1/1 2/2 3\nf 1 2 3\n");
    assert_eq!(records.len(), 1);
    let face = Face::from_record(&records[0].1).unwrap();
    assert_eq!(face.vertices.len(), 3);
    assert!(face.vertices.iter().all(|v| v.texture.is_none()));

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::FormatConsistencyError);
    assert!(diagnostics[0].message.contains("vertex number 3"));
    assert_eq!(diagnostics[0].source_line, "f 1/1 2/2 3");
}

#[test]
fn face_needs_three_vertices() {
    let (records, diagnostics) = parse_all("f 1 2\n");
    assert!(records.is_empty());
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].message,
        "parameter vertex number 3 is not specified"
    );
    assert_eq!(diagnostics[0].token, "eol");
}

#[test]
fn comments_are_transparent() {
    let plain = "v 1 2 3\nvn 0 0 1\nf 1//1 1//1 1//1\n";
    let commented = "# header\nv 1 2 3 # trailing\n\n   # indented\nvn 0 0 1\nf 1//1 1//1 1//1# tight\n#";

    for skip_comments in [true, false] {
        let config = ParserConfig::default().with_skip_comments(skip_comments);
        let (a, da) = parse_with(plain, config.clone());
        let (b, db) = parse_with(commented, config);
        assert!(da.is_empty());
        assert!(db.is_empty(), "{:?}", db);
        assert_eq!(a, b);
    }
}

#[test]
fn unsupported_and_unknown_keywords() {
    let (records, diagnostics) = parse_all("cstype bspline\nvx 1 2 3\nvn 0 1 0\n");
    assert_eq!(records.len(), 1);
    assert_eq!(
        Normal::from_record(&records[0].1),
        Some(Normal {
            i: 0.0,
            j: 1.0,
            k: 0.0
        })
    );
    assert_eq!(diagnostics.len(), 2);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::UnsupportedElementWarning);
    assert_eq!(
        diagnostics[0].message,
        "unsupported element format - curve surface type"
    );
    assert_eq!(diagnostics[1].kind, DiagnosticKind::SyntaxError);
    assert_eq!(diagnostics[1].line, 1);
    assert_eq!(diagnostics[1].token, "vx");
}

#[test]
fn crlf_line_endings() {
    let (records, diagnostics) = parse_all("v 1 2 3\r\nvt 0.5 0.25\r\n");
    assert!(diagnostics.is_empty());
    assert_eq!(records.len(), 2);
    assert_eq!(
        TextureVertex::from_record(&records[1].1),
        Some(TextureVertex {
            u: 0.5,
            v: Some(0.25),
            w: None
        })
    );
}

#[test]
fn diagnostic_rendering_points_at_token() {
    let (_, diagnostics) = parse_all("v 1.0 abc 3.0\n");
    let rendered = diagnostics[0].to_string();
    let mut lines = rendered.lines();
    assert_eq!(
        lines.next(),
        Some("[ERROR] line: 1, column: 7, token: 'abc', message: invalid Y coordinate, expected: FLOAT, received: WORD")
    );
    assert_eq!(lines.next(), Some("  -> v 1.0 abc 3.0"));
    assert_eq!(lines.next(), Some("           ^^^"));
}

#[test]
fn diagnostics_through_closure_sink() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = {
        let seen = Rc::clone(&seen);
        FnSink(move |d: Diagnostic| seen.borrow_mut().push(d.kind))
    };
    let registry = Registry::standard().unwrap();
    let mut dispatcher = Dispatcher::with_sink("bevel maybe\nmtllib a.mtl\n".as_bytes(), registry, sink);
    assert!(dispatcher.next().is_end_of_file());
    assert_eq!(
        *seen.borrow(),
        vec![
            DiagnosticKind::SemanticError,
            DiagnosticKind::UnsupportedElementWarning
        ]
    );
}

struct FailingReader {
    served: bool,
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.served {
            return Err(io::Error::new(io::ErrorKind::Other, "disk on fire"));
        }
        self.served = true;
        let data = b"v 1 2 3\nv 4 5";
        buf[..data.len()].copy_from_slice(data);
        Ok(data.len())
    }
}

#[test]
fn read_failure_ends_the_stream() {
    let errors = Rc::new(RefCell::new(Vec::new()));
    let registry = Registry::standard().unwrap();
    let mut dispatcher =
        Dispatcher::with_sink(FailingReader { served: false }, registry, Vec::new());
    {
        let errors = Rc::clone(&errors);
        dispatcher.set_io_error_handler(move |e| errors.borrow_mut().push(e.to_string()));
    }
    assert!(!dispatcher.next().is_end_of_file());
    assert!(dispatcher.next().is_end_of_file());
    assert_eq!(errors.borrow().len(), 1);
    assert!(errors.borrow()[0].contains("disk on fire"));
    // the truncated second line is reported at EOF
    assert_eq!(dispatcher.sink()[0].token, "eof");
}

#[test]
fn names_with_punctuation() {
    let (records, diagnostics) =
        parse_all("usemtl Material.001\no my-cube\ng left-1 part.2 3\n");
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].1.text(0), Some("Material.001"));
    assert_eq!(records[1].1.text(0), Some("my-cube"));
    let groups = records[2].1.repeated(0);
    assert_eq!(groups.len(), 3);
    assert_eq!(
        groups[1][0].as_ref().and_then(Value::as_str),
        Some("part.2")
    );
}
