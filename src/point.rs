use crate::time::unix_now_micros;

// A Point is a single named observation: what was measured, when, and the
// value observed.  Points are immutable once created and are timestamped at
// ingestion time, not at flush time.

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Float(f64),
    Int(i64),
    Unsigned(u64),
    Bool(bool),
    Text(String),
}

impl From<f64> for Value {
    fn from(v: f64) -> Value {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Value {
        Value::Float(v as f64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Value {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Value {
        Value::Int(v as i64)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Value {
        Value::Unsigned(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Value {
        Value::Unsigned(v as u64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Value {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Value {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Value {
        Value::Text(v)
    }
}

#[derive(Clone, Debug)]
pub struct Point {
    pub name: String,
    pub timestamp: u64, // microseconds since the epoch
    pub value: Value,
}

impl Point {
    pub fn new(name: &str, value: Value) -> Point {
        Point {
            name: name.to_string(),
            timestamp: unix_now_micros(),
            value,
        }
    }
}

#[test]
pub fn test_value_conversions() {
    assert!(Value::from(1i32) == Value::Int(1));
    assert!(Value::from(-2i64) == Value::Int(-2));
    assert!(Value::from(3u32) == Value::Unsigned(3));
    assert!(Value::from(4u64) == Value::Unsigned(4));
    assert!(Value::from(2.5f64) == Value::Float(2.5));
    assert!(Value::from(0.5f32) == Value::Float(0.5));
    assert!(Value::from(true) == Value::Bool(true));
    assert!(Value::from("x") == Value::Text("x".to_string()));
    assert!(Value::from("y".to_string()) == Value::Text("y".to_string()));
}

#[test]
pub fn test_point_carries_current_time() {
    let before = unix_now_micros();
    let p = Point::new("m", Value::Int(1));
    let after = unix_now_micros();
    assert!(p.name == "m");
    assert!(p.timestamp >= before && p.timestamp <= after);
}
