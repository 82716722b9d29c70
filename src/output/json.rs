use crate::errors::Result;
use serde::Serialize;
use std::io::Write;

/// Write any result value object as pretty JSON followed by a newline.
pub fn write_json<T: Serialize + ?Sized>(writer: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucketing::{top_n, TopNConfig};
    use crate::store::{RecordStore, Value};

    #[test]
    fn bucketed_result_serializes_kinds() {
        let store = RecordStore::builder()
            .row([("c", Value::from("Uruguay"))])
            .row([("c", Value::from("Chile"))])
            .build();
        let result = top_n(&store.view(), "c", &TopNConfig::new(1).unwrap()).unwrap();
        let mut buf = Vec::new();
        write_json(&mut buf, &result).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(json["category"], "c");
        assert_eq!(json["entries"][0]["label"], "Chile");
        assert_eq!(json["entries"][1]["kind"], "other");
        assert_eq!(json["entries"][1]["percentage"], 50.0);
    }
}
