//! Human-readable hex dump of an envelope.
//!
//! The dump prints the tag, then one line per field or collection item in layout order,
//! indented by nesting depth. Composite and collection headers show only the bytes they own
//! themselves (presence byte and count); leaves show their complete encoding.

use crate::classify::{classify, element_type, ObjectType};
use crate::encoder::{Encoder, PRESENT};
use crate::envelope::{BinarySerializer, Limits};
use crate::schema::TypeDescriptor;
use crate::value::Value;
use crate::Result;

const INDENT: &str = "  ";

/// Dumps the envelope `bytes`, which must hold a `target`.
///
/// # Errors
/// Fails exactly where [`BinarySerializer::deserialize_value`] fails.
pub fn dump(target: &TypeDescriptor, bytes: &[u8]) -> Result<String> {
    let mut source = bytes;
    let value = BinarySerializer::new().deserialize_value(target, &mut source)?;

    let mut printer = Printer {
        out: String::new(),
    };
    printer.line(0, "tag", &hex(target.tag().as_bytes()));
    printer.node(0, target.name(), &value, target)?;
    if !source.is_empty() {
        printer
            .out
            .push_str(&format!("trailing: {} bytes\n", source.len()));
    }
    Ok(printer.out)
}

struct Printer {
    out: String,
}

impl Printer {
    fn node(
        &mut self,
        depth: usize,
        label: &str,
        value: &Value,
        declared: &TypeDescriptor,
    ) -> Result<()> {
        match (classify(declared), value) {
            (ObjectType::Class | ObjectType::Struct, Value::Record(record)) => {
                // The root composite has no presence byte.
                let header = if depth > 0 && classify(declared) == ObjectType::Class {
                    hex(&[PRESENT])
                } else {
                    String::new()
                };
                self.line(depth, label, &header);
                for (field, field_value) in declared.fields().iter().zip(record.fields()) {
                    self.node(depth + 1, field.name(), field_value, field.descriptor())?;
                }
                Ok(())
            }
            (ObjectType::Enumerable, Value::Sequence(items)) => {
                let count = i32::try_from(items.len()).unwrap_or(i32::MAX);
                let mut header = vec![PRESENT];
                header.extend_from_slice(&count.to_le_bytes());
                self.line(depth, label, &hex(&header));
                if let Some(element) = element_type(declared) {
                    for (index, item) in items.iter().enumerate() {
                        self.node(depth + 1, &format!("[{}]", index), item, element)?;
                    }
                }
                Ok(())
            }
            _ => {
                let mut encoded = Vec::new();
                Encoder::new(&mut encoded, Limits::default()).write_payload(value, declared)?;
                self.line(depth, label, &hex(&encoded));
                Ok(())
            }
        }
    }

    fn line(&mut self, depth: usize, label: &str, bytes: &str) {
        for _ in 0..depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(label);
        self.out.push(':');
        if !bytes.is_empty() {
            self.out.push(' ');
            self.out.push_str(bytes);
        }
        self.out.push('\n');
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
