// Copyright 2026 the Softmask Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes them as a JSON array, one object per event, in recording order.
//! Each object carries an `"event"` name plus the event's fields; element
//! handles become `{"index": .., "generation": ..}` objects and absent values
//! become `null`.

use std::io::{self, Write};

use serde_json::{Value, json};

use softmask_core::element::ElementId;
use softmask_core::trace::DetachReason;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as a pretty-printed JSON array.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let events: Vec<Value> = decode(bytes).map(to_value).collect();
    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

/// Converts one recorded event to its JSON form.
#[must_use]
pub fn to_value(recorded: RecordedEvent) -> Value {
    match recorded {
        RecordedEvent::Attach(e) => json!({
            "event": "attach",
            "element": id(e.element),
        }),
        RecordedEvent::Detach(e) => json!({
            "event": "detach",
            "element": id(e.element),
            "reason": reason_name(e.reason),
        }),
        RecordedEvent::Bind(e) => json!({
            "event": "bind",
            "element": id(e.element),
            "previous": e.previous.map(id),
            "current": e.current.map(id),
        }),
        RecordedEvent::Acquire(e) => json!({
            "event": "acquire",
            "element": id(e.element),
            "mask": id(e.mask),
            "base": e.base.0,
            "replacement": e.replacement.map(|r| r.0),
        }),
        RecordedEvent::Release(e) => json!({
            "event": "release",
            "element": id(e.element),
            "mask": id(e.mask),
            "replacement": e.replacement.0,
        }),
        RecordedEvent::Unsupported(e) => json!({
            "event": "unsupported",
            "element": id(e.element),
            "mask": id(e.mask),
            "base": e.base.0,
        }),
        RecordedEvent::Prune(e) => json!({
            "event": "prune",
            "tick": e.tick,
            "checked": e.checked,
            "pruned": e.pruned,
        }),
    }
}

fn reason_name(reason: DetachReason) -> &'static str {
    match reason {
        DetachReason::Pruned => "pruned",
        DetachReason::Destroyed => "destroyed",
        DetachReason::Explicit => "explicit",
    }
}

fn id(element: ElementId) -> Value {
    json!({
        "index": element.index(),
        "generation": element.generation(),
    })
}
