use crate::point::Value;

// Line-protocol batch construction.  A Batch is bound to the database and
// time precision it will be written with; points are encoded into it one at a
// time and a point that cannot be encoded (malformed name or value) fails
// individually without affecting the points already in the batch.
//
// The encoding is the InfluxDB v1 line protocol with a single field per
// point, named "value", and no tags:
//
//   <measurement> value=<field-value> <timestamp>

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Precision {
    Second,
    Milli,
    Micro,
    Nano,
}

impl Precision {
    // The value of the "precision" query parameter the sink expects.
    pub fn wire_param(self) -> &'static str {
        match self {
            Precision::Second => "s",
            Precision::Milli => "ms",
            Precision::Micro => "u",
            Precision::Nano => "ns",
        }
    }

    // Point timestamps are in microseconds.  Scaling up to nanoseconds cannot
    // overflow a u64 for another half million years.
    fn from_micros(self, t: u64) -> u64 {
        match self {
            Precision::Second => t / 1_000_000,
            Precision::Milli => t / 1_000,
            Precision::Micro => t,
            Precision::Nano => t * 1_000,
        }
    }
}

pub struct BatchConfig {
    pub database: String,
    pub precision: Precision,
}

pub struct Batch {
    database: String,
    precision: Precision,
    lines: Vec<String>,
}

impl Batch {
    pub fn new(config: BatchConfig) -> Batch {
        Batch {
            database: config.database,
            precision: config.precision,
            lines: Vec::new(),
        }
    }

    // Encode one point into the batch.  On error the batch is unchanged and
    // the point should be considered malformed, not transiently unsendable.
    pub fn add_point(
        &mut self,
        name: &str,
        timestamp_micros: u64,
        value: &Value,
    ) -> Result<(), String> {
        let measurement = escape_measurement(name)?;
        let field = encode_field_value(value)?;
        let timestamp = self.precision.from_micros(timestamp_micros);
        self.lines.push(format!("{measurement} value={field} {timestamp}"));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    // The request body for one write: newline-separated points, with a
    // trailing newline when the batch is nonempty.
    pub fn to_line_protocol(&self) -> String {
        if self.lines.is_empty() {
            return "".to_string();
        }
        self.lines.join("\n") + "\n"
    }
}

// Measurement names escape ',' and ' '; control characters have no escape in
// the line protocol, so a name containing one is malformed.

fn escape_measurement(name: &str) -> Result<String, String> {
    if name.is_empty() {
        return Err("Empty measurement name".to_string());
    }
    let mut t = "".to_string();
    for c in name.chars() {
        match c {
            ',' | ' ' => {
                t.push('\\');
                t.push(c);
            }
            '\n' | '\r' => {
                return Err("Line break in measurement name".to_string());
            }
            _ => t.push(c),
        }
    }
    Ok(t)
}

fn encode_field_value(value: &Value) -> Result<String, String> {
    match value {
        Value::Float(f) => {
            if !f.is_finite() {
                return Err(format!("Cannot encode non-finite float {f}"));
            }
            Ok(format!("{f}"))
        }
        Value::Int(i) => Ok(format!("{i}i")),
        Value::Unsigned(u) => Ok(format!("{u}u")),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Text(s) => {
            let mut t = "\"".to_string();
            for c in s.chars() {
                match c {
                    '"' | '\\' => {
                        t.push('\\');
                        t.push(c);
                    }
                    '\n' | '\r' => {
                        return Err("Line break in string value".to_string());
                    }
                    _ => t.push(c),
                }
            }
            t.push('"');
            Ok(t)
        }
    }
}

#[cfg(test)]
fn micro_batch() -> Batch {
    Batch::new(BatchConfig {
        database: "testdb".to_string(),
        precision: Precision::Micro,
    })
}

#[test]
pub fn test_add_point_encoding() {
    let mut b = micro_batch();
    b.add_point("cpu load", 1_000_000, &Value::Float(12.5)).unwrap();
    b.add_point("reqs,total", 2_000_000, &Value::Int(-3)).unwrap();
    b.add_point("bytes", 3_000_000, &Value::Unsigned(7)).unwrap();
    b.add_point("up", 4_000_000, &Value::Bool(true)).unwrap();
    b.add_point("note", 5_000_000, &Value::Text(r#"a "b""#.to_string())).unwrap();
    assert!(b.len() == 5);
    assert!(b.lines()[0] == r#"cpu\ load value=12.5 1000000"#);
    assert!(b.lines()[1] == r#"reqs\,total value=-3i 2000000"#);
    assert!(b.lines()[2] == "bytes value=7u 3000000");
    assert!(b.lines()[3] == "up value=true 4000000");
    assert!(b.lines()[4] == r#"note value="a \"b\"" 5000000"#);
}

#[test]
pub fn test_precision_conversion() {
    assert!(Precision::Second.wire_param() == "s");
    assert!(Precision::Milli.wire_param() == "ms");
    assert!(Precision::Micro.wire_param() == "u");
    assert!(Precision::Nano.wire_param() == "ns");

    let cases = [
        (Precision::Second, "m value=1i 2"),
        (Precision::Milli, "m value=1i 2500"),
        (Precision::Micro, "m value=1i 2500000"),
        (Precision::Nano, "m value=1i 2500000000"),
    ];
    for (precision, expect) in cases {
        let mut b = Batch::new(BatchConfig {
            database: "testdb".to_string(),
            precision,
        });
        b.add_point("m", 2_500_000, &Value::Int(1)).unwrap();
        assert!(b.lines()[0] == expect);
    }
}

#[test]
pub fn test_malformed_points_are_rejected() {
    let mut b = micro_batch();
    assert!(b.add_point("m", 0, &Value::Float(f64::NAN)).is_err());
    assert!(b.add_point("m", 0, &Value::Float(f64::INFINITY)).is_err());
    assert!(b.add_point("m", 0, &Value::Float(f64::NEG_INFINITY)).is_err());
    assert!(b.add_point("", 0, &Value::Int(1)).is_err());
    assert!(b.add_point("a\nb", 0, &Value::Int(1)).is_err());
    assert!(b.add_point("m", 0, &Value::Text("a\nb".to_string())).is_err());
    // A failed point must leave the batch unchanged.
    assert!(b.is_empty());
}

#[test]
pub fn test_line_protocol_body() {
    let mut b = micro_batch();
    assert!(b.to_line_protocol() == "");
    b.add_point("a", 1, &Value::Int(1)).unwrap();
    b.add_point("b", 2, &Value::Int(2)).unwrap();
    assert!(b.to_line_protocol() == "a value=1i 1\nb value=2i 2\n");
}
