//! Package overview for the `info` subcommand.

use crate::entitlements::{parse_property_map, PropertyValue};
use crate::error::Result;
use crate::fsutil;
use crate::package::{Content, Package};
use crate::rules::frameworks::embedded_frameworks;
use crate::size::FileSize;
use serde::Serialize;
use std::fs;

/// Info.plist keys surfaced by `info`.
const INFO_KEYS: [&str; 4] = [
    "CFBundleIdentifier",
    "CFBundleShortVersionString",
    "CFBundleVersion",
    "MinimumOSVersion",
];

#[derive(Debug, Serialize)]
pub struct PackageInfo {
    pub filename: String,
    pub ipa_size: FileSize,
    pub app_name: String,
    pub app_size: FileSize,
    /// Selected Info.plist keys in display order; absent keys are skipped.
    pub properties: Vec<(String, String)>,
    pub frameworks: Vec<String>,
}

pub fn collect(package: &Package, content: &Content) -> Result<PackageInfo> {
    let app_size = fsutil::directory_size(&content.app)?;
    let info_plist = content.app.join("Info.plist");
    let properties = if info_plist.is_file() {
        let map = parse_property_map(&fs::read(&info_plist)?)?;
        INFO_KEYS
            .iter()
            .filter_map(|key| match map.get(*key) {
                Some(PropertyValue::String(v)) => Some((key.to_string(), v.clone())),
                _ => None,
            })
            .collect()
    } else {
        Vec::new()
    };
    Ok(PackageInfo {
        filename: package.file_name(),
        ipa_size: package.size,
        app_name: content
            .app
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        app_size,
        properties,
        frameworks: embedded_frameworks(content)?.into_iter().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn collects_plist_keys_and_frameworks() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let app = root.join("Payload/Demo.app");
        fs::create_dir_all(app.join("Frameworks/Core.framework")).unwrap();
        fs::write(app.join("Frameworks/Core.framework/Core"), vec![0u8; 10]).unwrap();
        fs::write(
            app.join("Info.plist"),
            r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0"><dict>
<key>CFBundleIdentifier</key><string>com.example.demo</string>
<key>CFBundleVersion</key><string>42</string>
<key>UIRequiredDeviceCapabilities</key><array/>
</dict></plist>"#,
        )
        .unwrap();
        let ipa = root.join("Demo.ipa");
        fs::write(&ipa, vec![0u8; 64]).unwrap();

        let package = Package::open(&ipa).unwrap();
        let content = Content::scan(root).unwrap();
        let info = collect(&package, &content).unwrap();
        assert_eq!(info.filename, "Demo.ipa");
        assert_eq!(info.app_name, "Demo.app");
        assert_eq!(info.ipa_size.bytes(), 64);
        assert_eq!(
            info.properties,
            vec![
                ("CFBundleIdentifier".to_string(), "com.example.demo".to_string()),
                ("CFBundleVersion".to_string(), "42".to_string()),
            ]
        );
        assert_eq!(info.frameworks, vec!["Core"]);
    }
}
