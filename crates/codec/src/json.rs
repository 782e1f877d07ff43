//! JSON codec for values objects.
//!
//! Decoding is schema-driven: the declared attribute kind or relationship
//! cardinality decides how each JSON value is read, and any incompatible
//! shape aborts the whole document. Encoding is schema-free and total,
//! because every [`Value`] already carries its precise kind.
//!
//! | Kind | JSON Representation |
//! |------|---------------------|
//! | null | `null` |
//! | string / boolean / integer | direct counterpart |
//! | double | number, or `{"$f64": "NaN" \| "+Inf" \| "-Inf"}` when non-finite |
//! | date | integer seconds since the Unix epoch (sub-second precision is dropped) |
//! | binary | standard Base64 string |
//! | transformable | the payload's own JSON |
//! | to-one reference | identifier string |
//! | to-many reference | array of identifier strings |

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value as JsonValue};
use tracing::{trace, warn};

use entitystore_core::{
    Attribute, AttributeKind, Cardinality, DecodeError, DecodeResult, Entity, Property, Reference,
    Relationship, Scalar, Value, ValuesObject,
};

/// Property name reported when the document itself has the wrong shape.
pub const DOCUMENT: &str = "$document";

/// Key of the canonical encoding of non-finite doubles.
pub const SPECIAL_FLOAT_KEY: &str = "$f64";

// ============================================================================
// Decode
// ============================================================================

/// Decode a JSON document into a values object for `entity`.
///
/// Every declared property appears in the result; keys missing from the
/// document become [`Value::Null`]. Undeclared document keys are ignored.
/// Optionality is not enforced here.
///
/// # Errors
///
/// Returns `DecodeFailure` if the document is not an object or if any
/// declared key holds an incompatible JSON shape. No partial result is
/// returned.
pub fn decode(document: &JsonValue, entity: &Entity) -> DecodeResult<ValuesObject> {
    decode_document(document, entity, true)
}

/// Decode an edit payload: keys missing from the document are omitted.
///
/// # Errors
///
/// Same as [`decode`].
pub fn decode_changes(document: &JsonValue, entity: &Entity) -> DecodeResult<ValuesObject> {
    decode_document(document, entity, false)
}

/// Parse JSON text and [`decode`] it.
///
/// # Errors
///
/// Returns `Malformed` for invalid JSON text, otherwise as [`decode`].
pub fn decode_str(text: &str, entity: &Entity) -> DecodeResult<ValuesObject> {
    let document: JsonValue =
        serde_json::from_str(text).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    decode(&document, entity)
}

fn decode_document(
    document: &JsonValue,
    entity: &Entity,
    absent_as_null: bool,
) -> DecodeResult<ValuesObject> {
    let result = document
        .as_object()
        .ok_or_else(|| DecodeError::failure(DOCUMENT, "expected a JSON object"))
        .and_then(|object| decode_object(object, entity, absent_as_null));

    if let Err(e) = &result {
        warn!(entity = entity.name(), error = %e, "decode aborted");
    }
    result
}

fn decode_object(
    object: &Map<String, JsonValue>,
    entity: &Entity,
    absent_as_null: bool,
) -> DecodeResult<ValuesObject> {
    let mut values = ValuesObject::new();
    for property in entity.properties() {
        let name = property.name();
        let value = match object.get(name) {
            Some(json) => decode_property(property, json)?,
            None if absent_as_null => Value::Null,
            None => continue,
        };
        values.insert(name, value);
    }
    trace!(entity = entity.name(), keys = values.len(), "decoded document");
    Ok(values)
}

fn decode_property(property: Property<'_>, json: &JsonValue) -> DecodeResult<Value> {
    match property {
        Property::Attribute(attribute) => decode_attribute(attribute, json),
        Property::Relationship(relationship) => decode_relationship(relationship, json),
    }
}

/// Decode one attribute value, dispatching on (declared kind, JSON type).
///
/// JSON `null` decodes to [`Value::Null`], except that a transformable
/// decoder is offered `null` first: a payload that encodes as `null` reads
/// back as itself, and a decoder that rejects `null` yields [`Value::Null`].
///
/// # Errors
///
/// Returns `DecodeFailure` for any pairing other than the supported ones.
pub fn decode_attribute(attribute: &Attribute, json: &JsonValue) -> DecodeResult<Value> {
    if json.is_null() {
        let payload = match attribute.kind() {
            AttributeKind::Transformable => attribute.decoder().and_then(|d| d.from_json(json)),
            _ => None,
        };
        return Ok(payload.map_or(Value::Null, |payload| {
            Value::Attribute(Scalar::Transformable(payload))
        }));
    }

    let name = attribute.name();
    let fail = |expected: &str| {
        DecodeError::failure(
            name,
            format!(
                "expected {} for {} attribute, found {}",
                expected,
                attribute.kind(),
                json_type_name(json)
            ),
        )
    };

    let scalar = match (attribute.kind(), json) {
        (AttributeKind::String, JsonValue::String(s)) => Scalar::String(s.clone()),
        (AttributeKind::Boolean, JsonValue::Bool(b)) => Scalar::Boolean(*b),
        (AttributeKind::Integer, JsonValue::Number(n)) => {
            Scalar::Integer(n.as_i64().ok_or_else(|| fail("an integer"))?)
        }
        (AttributeKind::Double, JsonValue::Number(n)) => {
            Scalar::Double(n.as_f64().ok_or_else(|| fail("a number"))?)
        }
        (AttributeKind::Double, JsonValue::Object(obj)) => {
            Scalar::Double(special_float_from_json(obj).ok_or_else(|| fail("a number"))?)
        }
        (AttributeKind::Date, JsonValue::Number(n)) => {
            let date = match n.as_i64() {
                Some(seconds) => Utc.timestamp_opt(seconds, 0).single(),
                None => n.as_f64().and_then(seconds_to_date),
            };
            Scalar::Date(date.ok_or_else(|| {
                DecodeError::failure(name, format!("date out of range: {}", n))
            })?)
        }
        (AttributeKind::Binary, JsonValue::String(encoded)) => {
            Scalar::Binary(BASE64.decode(encoded).map_err(|e| {
                DecodeError::failure(name, format!("invalid base64: {}", e))
            })?)
        }
        (AttributeKind::Transformable, json) => {
            let decoder = attribute.decoder().ok_or_else(|| {
                DecodeError::failure(name, "no decoder declared for transformable attribute")
            })?;
            let payload = decoder.from_json(json).ok_or_else(|| {
                DecodeError::failure(
                    name,
                    format!("'{}' payload rejected the document", decoder.type_name()),
                )
            })?;
            Scalar::Transformable(payload)
        }
        (AttributeKind::String, _) => return Err(fail("a string")),
        (AttributeKind::Boolean, _) => return Err(fail("a boolean")),
        (AttributeKind::Integer, _) => return Err(fail("an integer")),
        (AttributeKind::Double, _) => return Err(fail("a number")),
        (AttributeKind::Date, _) => return Err(fail("seconds since epoch")),
        (AttributeKind::Binary, _) => return Err(fail("a base64 string")),
    };

    Ok(Value::Attribute(scalar))
}

/// Decode one relationship value: a string for to-one, an array of strings
/// for to-many.
///
/// # Errors
///
/// Returns `DecodeFailure` for any other shape.
pub fn decode_relationship(relationship: &Relationship, json: &JsonValue) -> DecodeResult<Value> {
    let name = relationship.name();
    match (relationship.cardinality(), json) {
        (_, JsonValue::Null) => Ok(Value::Null),
        (Cardinality::ToOne, JsonValue::String(id)) => Ok(Value::to_one(id.as_str())),
        (Cardinality::ToMany, JsonValue::Array(items)) => {
            let ids = items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        DecodeError::failure(
                            name,
                            format!("expected identifier string, found {}", json_type_name(item)),
                        )
                    })
                })
                .collect::<DecodeResult<Vec<String>>>()?;
            Ok(Value::Relationship(Reference::ToMany(ids)))
        }
        (cardinality, other) => Err(DecodeError::failure(
            name,
            format!(
                "unexpected {} for {} relationship",
                json_type_name(other),
                cardinality
            ),
        )),
    }
}

// ============================================================================
// Encode
// ============================================================================

/// Encode a values object as a JSON object. Never fails.
pub fn encode(values: &ValuesObject) -> JsonValue {
    let object: Map<String, JsonValue> = values
        .iter()
        .map(|(key, value)| (key.to_string(), encode_value(value)))
        .collect();
    JsonValue::Object(object)
}

/// Encode a values object as JSON text. Never fails.
pub fn encode_string(values: &ValuesObject) -> String {
    encode(values).to_string()
}

/// Encode one value. Never fails.
pub fn encode_value(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Attribute(scalar) => encode_scalar(scalar),
        Value::Relationship(Reference::ToOne(id)) => JsonValue::String(id.clone()),
        Value::Relationship(Reference::ToMany(ids)) => {
            JsonValue::Array(ids.iter().cloned().map(JsonValue::String).collect())
        }
    }
}

fn encode_scalar(scalar: &Scalar) -> JsonValue {
    match scalar {
        Scalar::String(s) => JsonValue::String(s.clone()),
        Scalar::Boolean(b) => JsonValue::Bool(*b),
        Scalar::Integer(i) => JsonValue::Number((*i).into()),
        Scalar::Double(f) => float_to_json(*f),
        Scalar::Date(d) => JsonValue::Number(date_to_seconds(d).into()),
        Scalar::Binary(bytes) => JsonValue::String(BASE64.encode(bytes)),
        Scalar::Transformable(payload) => payload.to_json(),
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Whole seconds since the Unix epoch; the sub-second part is dropped.
pub fn date_to_seconds(date: &DateTime<Utc>) -> i64 {
    date.timestamp()
}

/// Date for a fractional seconds count, floored to the whole second below.
///
/// `None` if out of range or not finite.
pub fn seconds_to_date(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() || seconds < i64::MIN as f64 || seconds >= i64::MAX as f64 {
        return None;
    }
    Utc.timestamp_opt(seconds.floor() as i64, 0).single()
}

/// Convert a float to JSON, handling non-finite values.
fn float_to_json(f: f64) -> JsonValue {
    if f.is_nan() {
        special_float("NaN")
    } else if f.is_infinite() {
        if f.is_sign_positive() {
            special_float("+Inf")
        } else {
            special_float("-Inf")
        }
    } else {
        serde_json::Number::from_f64(f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null)
    }
}

fn special_float(tag: &str) -> JsonValue {
    let mut obj = Map::new();
    obj.insert(SPECIAL_FLOAT_KEY.to_string(), JsonValue::String(tag.to_string()));
    JsonValue::Object(obj)
}

/// Parse the canonical `{"$f64": "..."}` object.
fn special_float_from_json(obj: &Map<String, JsonValue>) -> Option<f64> {
    if obj.len() != 1 {
        return None;
    }
    match obj.get(SPECIAL_FLOAT_KEY)?.as_str()? {
        "NaN" => Some(f64::NAN),
        "+Inf" => Some(f64::INFINITY),
        "-Inf" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

fn json_type_name(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(n) if n.is_f64() => "double",
        JsonValue::Number(_) => "integer",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
