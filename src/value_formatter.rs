use std::io::{self, Write};

use crate::json;
use crate::provider::{FormatProvider, InvariantFormat};
use crate::value::{PropertyValue, Scalar, Structure};

/// Discriminator key used for structure type tags unless configured
/// otherwise.
pub const DEFAULT_TYPE_TAG_NAME: &str = "$type";

/// Writes a [`PropertyValue`] tree as JSON.
///
/// Output is a pure function of the input tree: field order follows the
/// tree and numbers never depend on locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonValueFormatter {
    type_tag_name: Option<String>,
}

impl Default for JsonValueFormatter {
    fn default() -> Self {
        JsonValueFormatter {
            type_tag_name: Some(DEFAULT_TYPE_TAG_NAME.to_string()),
        }
    }
}

impl JsonValueFormatter {
    /// `None` drops type tags from structures entirely.
    pub fn new(type_tag_name: Option<impl Into<String>>) -> Self {
        JsonValueFormatter {
            type_tag_name: type_tag_name.map(Into::into),
        }
    }

    pub fn type_tag_name(&self) -> Option<&str> {
        self.type_tag_name.as_deref()
    }

    pub fn format<W: Write + ?Sized>(&self, value: &PropertyValue, out: &mut W) -> io::Result<()> {
        match value {
            PropertyValue::Scalar(scalar) => self.format_scalar(scalar, out),
            PropertyValue::Sequence(items) => self.format_sequence(items, out),
            PropertyValue::Structure(structure) => self.format_structure(structure, out),
            PropertyValue::Dictionary(entries) => self.format_dictionary(entries, out),
        }
    }

    fn format_scalar<W: Write + ?Sized>(&self, scalar: &Scalar, out: &mut W) -> io::Result<()> {
        match scalar {
            Scalar::Null => out.write_all(b"null"),
            Scalar::Bool(true) => out.write_all(b"true"),
            Scalar::Bool(false) => out.write_all(b"false"),
            Scalar::I64(i) => json::write_i64(out, *i),
            Scalar::U64(u) => json::write_u64(out, *u),
            Scalar::F64(f) => json::write_f64(out, *f),
            Scalar::Char(c) => json::write_str(out, c.encode_utf8(&mut [0; 4])),
            Scalar::String(s) => json::write_str(out, s),
            Scalar::Timestamp(ts) => json::write_timestamp(out, ts),
            Scalar::TraceId(id) => write!(out, "\"{}\"", id),
            Scalar::SpanId(id) => write!(out, "\"{}\"", id),
            Scalar::SpanKind(kind) => json::write_str(out, kind.as_str()),
        }
    }

    fn format_sequence<W: Write + ?Sized>(&self, items: &[PropertyValue], out: &mut W) -> io::Result<()> {
        out.write_all(b"[")?;
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                out.write_all(b",")?;
            }
            self.format(item, out)?;
        }
        out.write_all(b"]")
    }

    fn format_structure<W: Write + ?Sized>(&self, structure: &Structure, out: &mut W) -> io::Result<()> {
        out.write_all(b"{")?;
        let mut delim = "";
        for (name, value) in &structure.fields {
            out.write_all(delim.as_bytes())?;
            delim = ",";
            json::write_str(out, name)?;
            out.write_all(b":")?;
            self.format(value, out)?;
        }

        if let (Some(key), Some(tag)) = (&self.type_tag_name, &structure.type_tag) {
            out.write_all(delim.as_bytes())?;
            json::write_str(out, key)?;
            out.write_all(b":")?;
            json::write_str(out, tag)?;
        }
        out.write_all(b"}")
    }

    fn format_dictionary<W: Write + ?Sized>(
        &self,
        entries: &[(PropertyValue, PropertyValue)],
        out: &mut W,
    ) -> io::Result<()> {
        out.write_all(b"{")?;
        let mut key = String::new();
        for (i, (k, v)) in entries.iter().enumerate() {
            if i > 0 {
                out.write_all(b",")?;
            }
            key.clear();
            dictionary_key(k, &mut key);
            json::write_str(out, &key)?;
            out.write_all(b":")?;
            self.format(v, out)?;
        }
        out.write_all(b"}")
    }
}

/// JSON object keys must be strings; anything else is reduced to its
/// canonical text.
fn dictionary_key(key: &PropertyValue, out: &mut String) {
    match key {
        PropertyValue::Scalar(Scalar::String(s)) => out.push_str(s),
        PropertyValue::Scalar(scalar) => InvariantFormat.format_scalar(scalar, None, out),
        other => crate::render::render_value(other, None, &InvariantFormat, out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use crate::trace::SpanKind;

    fn to_json(formatter: &JsonValueFormatter, value: &PropertyValue) -> String {
        let mut buf = Vec::new();
        formatter.format(value, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn scalars() {
        let f = JsonValueFormatter::default();
        assert_eq!(to_json(&f, &PropertyValue::null()), "null");
        assert_eq!(to_json(&f, &true.into()), "true");
        assert_eq!(to_json(&f, &(-3).into()), "-3");
        assert_eq!(to_json(&f, &u64::MAX.into()), "18446744073709551615");
        assert_eq!(to_json(&f, &0.25.into()), "0.25");
        assert_eq!(to_json(&f, &'"'.into()), r#""\"""#);
        assert_eq!(to_json(&f, &"tab\t".into()), r#""tab\t""#);
        assert_eq!(to_json(&f, &SpanKind::Client.into()), r#""Client""#);

        let ts = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(to_json(&f, &ts.into()), r#""2020-01-02T03:04:05.000000000Z""#);
    }

    #[test]
    fn structure_type_tag_comes_last() {
        let value: PropertyValue =
            Structure::tagged("User", vec![("Id".into(), 1.into()), ("Name".into(), "n".into())]).into();

        let f = JsonValueFormatter::default();
        assert_eq!(to_json(&f, &value), r#"{"Id":1,"Name":"n","$type":"User"}"#);

        let f = JsonValueFormatter::new(Some("_typeTag"));
        assert_eq!(to_json(&f, &value), r#"{"Id":1,"Name":"n","_typeTag":"User"}"#);

        let f = JsonValueFormatter::new(None::<String>);
        assert_eq!(to_json(&f, &value), r#"{"Id":1,"Name":"n"}"#);
    }

    #[test]
    fn tag_only_structure() {
        let value: PropertyValue = Structure::tagged("Empty", vec![]).into();
        let f = JsonValueFormatter::default();
        assert_eq!(to_json(&f, &value), r#"{"$type":"Empty"}"#);
    }

    #[test]
    fn dictionary_keys_are_stringified() {
        let value = PropertyValue::Dictionary(vec![
            (1.into(), "one".into()),
            (true.into(), PropertyValue::null()),
            ("k".into(), vec![1, 2].into()),
            (PropertyValue::null(), 0.into()),
        ]);
        let f = JsonValueFormatter::default();
        assert_eq!(
            to_json(&f, &value),
            r#"{"1":"one","true":null,"k":[1,2],"null":0}"#
        );
    }

    #[test]
    fn duplicate_keys_kept_in_order() {
        let value = PropertyValue::Dictionary(vec![
            (1.into(), "int".into()),
            ("1".into(), "string".into()),
        ]);
        let f = JsonValueFormatter::default();
        assert_eq!(to_json(&f, &value), r#"{"1":"int","1":"string"}"#);
    }

    #[test]
    fn nested_sequences() {
        let value: PropertyValue = vec![PropertyValue::from(vec![1]), PropertyValue::Sequence(vec![])].into();
        let f = JsonValueFormatter::default();
        assert_eq!(to_json(&f, &value), "[[1],[]]");
    }
}
