//! Code-signing entitlements lookup.
//!
//! The production reader shells out to `codesign` and parses the property
//! list it prints. Values are flattened into [`PropertyValue`] so rules never
//! touch `plist` types directly.

use crate::error::ExtractionError;
use log::debug;
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    StringArray(Vec<String>),
    Boolean(bool),
    Integer(i64),
    /// Any other shape, carrying its kind name for diagnostics.
    Other(String),
}

impl PropertyValue {
    pub fn kind(&self) -> &str {
        match self {
            PropertyValue::String(_) => "string",
            PropertyValue::StringArray(_) => "string array",
            PropertyValue::Boolean(_) => "boolean",
            PropertyValue::Integer(_) => "integer",
            PropertyValue::Other(kind) => kind,
        }
    }
}

pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// Reads the entitlements of an app bundle.
pub trait EntitlementsReader: Send + Sync {
    fn entitlements(&self, app_bundle: &Path) -> Result<PropertyMap, ExtractionError>;
}

/// Uses `codesign -d --entitlements :- <app>`.
pub struct CodesignEntitlements;

impl EntitlementsReader for CodesignEntitlements {
    fn entitlements(&self, app_bundle: &Path) -> Result<PropertyMap, ExtractionError> {
        debug!("reading entitlements of {}", app_bundle.display());
        let output = Command::new("codesign")
            .args(["-d", "--entitlements", ":-"])
            .arg(app_bundle)
            .output()?;
        if !output.status.success() {
            return Err(ExtractionError::Tool {
                tool: "codesign",
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            return Ok(PropertyMap::new());
        }
        parse_property_map(&output.stdout)
    }
}

/// Parse an XML or binary plist whose root is a dictionary.
pub fn parse_property_map(bytes: &[u8]) -> Result<PropertyMap, ExtractionError> {
    let value = plist::Value::from_reader(Cursor::new(bytes))?;
    let dict = value.into_dictionary().ok_or_else(|| ExtractionError::Tool {
        tool: "plist",
        message: "root is not a dictionary".to_string(),
    })?;
    Ok(dict.into_iter().map(|(k, v)| (k, convert(v))).collect())
}

fn convert(value: plist::Value) -> PropertyValue {
    match value {
        plist::Value::String(s) => PropertyValue::String(s),
        plist::Value::Boolean(b) => PropertyValue::Boolean(b),
        plist::Value::Integer(i) => match i.as_signed() {
            Some(n) => PropertyValue::Integer(n),
            None => PropertyValue::Other("integer".to_string()),
        },
        plist::Value::Array(items) => {
            let strings: Option<Vec<String>> = items.into_iter().map(|v| v.into_string()).collect();
            match strings {
                Some(s) => PropertyValue::StringArray(s),
                None => PropertyValue::Other("mixed array".to_string()),
            }
        }
        plist::Value::Dictionary(_) => PropertyValue::Other("dictionary".to_string()),
        plist::Value::Data(_) => PropertyValue::Other("data".to_string()),
        plist::Value::Date(_) => PropertyValue::Other("date".to_string()),
        plist::Value::Real(_) => PropertyValue::Other("real".to_string()),
        _ => PropertyValue::Other("unknown".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>application-identifier</key>
    <string>TEAM.com.example.app</string>
    <key>get-task-allow</key>
    <false/>
    <key>keychain-access-groups</key>
    <array>
        <string>TEAM.com.example.shared</string>
        <string>TEAM.com.example.app</string>
    </array>
    <key>com.apple.developer.associated-domains</key>
    <dict/>
</dict>
</plist>"#;

    #[test]
    fn parses_supported_and_unsupported_shapes() {
        let map = parse_property_map(SAMPLE.as_bytes()).unwrap();
        assert_eq!(
            map["application-identifier"],
            PropertyValue::String("TEAM.com.example.app".into())
        );
        assert_eq!(map["get-task-allow"], PropertyValue::Boolean(false));
        assert_eq!(
            map["keychain-access-groups"],
            PropertyValue::StringArray(vec![
                "TEAM.com.example.shared".into(),
                "TEAM.com.example.app".into()
            ])
        );
        assert_eq!(
            map["com.apple.developer.associated-domains"].kind(),
            "dictionary"
        );
    }

    #[test]
    fn non_dictionary_root_is_rejected() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0"><array/></plist>"#;
        assert!(parse_property_map(xml.as_bytes()).is_err());
    }
}
