// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Template data model: the parsed-and-interpolated JSON shape the
//! Coordinator consumes. Parsing and variable interpolation themselves are
//! out of scope here — a `Template` is assumed already resolved by the
//! caller, so this module is pure deserialization, not a parser.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level Template: named builders, a flat provisioner list, and an
/// ordered list of post-processor sequences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub builders: Vec<BuilderConfig>,
    #[serde(default)]
    pub provisioners: Vec<ProvisionerConfig>,
    #[serde(default, rename = "post-processors")]
    pub post_processors: Vec<PostProcessorSequence>,
}

impl Template {
    /// Look up a builder config by its resolved `name` (defaulting to `type`
    /// when the template omitted one).
    pub fn build_names(&self) -> Vec<String> {
        self.builders.iter().map(BuilderConfig::resolved_name).collect()
    }
}

/// One entry of the `builders` array.
///
/// `raw` holds one fragment per config source, in declaration order, so a
/// Builder's `prepare` can fold them left-to-right ("later wins", §4.6). A
/// template entry always contributes exactly one fragment (the full JSON
/// object, `type`/`name` included); callers that layer `-var-file`-style
/// overrides on top push additional fragments onto the same build's `raw`
/// before calling `prepare`.
#[derive(Debug, Clone, Serialize)]
pub struct BuilderConfig {
    #[serde(rename = "type")]
    pub builder_type: String,
    pub name: Option<String>,
    #[serde(skip)]
    pub raw: Vec<Value>,
}

impl BuilderConfig {
    /// The build's name: the explicit `name`, or `type` if omitted.
    pub fn resolved_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.builder_type.clone())
    }
}

impl<'de> Deserialize<'de> for BuilderConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        let builder_type = raw
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| serde::de::Error::missing_field("type"))?
            .to_string();
        let name = raw.get("name").and_then(Value::as_str).map(str::to_string);
        Ok(BuilderConfig { builder_type, name, raw: vec![raw] })
    }
}

/// One entry of the flat `provisioners` array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionerConfig {
    #[serde(rename = "type")]
    pub provisioner_type: String,
    #[serde(default)]
    pub only: Vec<String>,
    #[serde(default)]
    pub except: Vec<String>,
    #[serde(flatten)]
    pub raw: Value,
}

impl ProvisionerConfig {
    /// Whether this provisioner applies to a build named `build_name`, per
    /// the only/except filter rules (§4.7): `only` is an allow-list when
    /// non-empty, `except` is a deny-list, `except` takes precedence.
    pub fn applies_to(&self, build_name: &str) -> bool {
        if self.except.iter().any(|n| n == build_name) {
            return false;
        }
        if !self.only.is_empty() {
            return self.only.iter().any(|n| n == build_name);
        }
        true
    }
}

/// One entry of the `post-processors` array: either a single post-processor
/// or a nested array of them. Both shapes normalize to a non-empty ordered
/// sequence.
#[derive(Debug, Clone)]
pub struct PostProcessorSequence(pub Vec<PostProcessorConfig>);

impl<'de> Deserialize<'de> for PostProcessorSequence {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shape {
            One(PostProcessorConfig),
            Many(Vec<PostProcessorConfig>),
        }

        match Shape::deserialize(deserializer)? {
            Shape::One(single) => Ok(PostProcessorSequence(vec![single])),
            Shape::Many(many) => Ok(PostProcessorSequence(many)),
        }
    }
}

impl Serialize for PostProcessorSequence {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

/// One post-processor entry, within a sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostProcessorConfig {
    #[serde(rename = "type")]
    pub post_processor_type: String,
    /// An empty name is ignored silently (§4.8 compatibility rule);
    /// `name()` reflects that by returning `None` for `Some("")`, too.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub keep_input_artifact: bool,
    #[serde(default)]
    pub only: Vec<String>,
    #[serde(default)]
    pub except: Vec<String>,
    #[serde(flatten)]
    pub raw: Value,
}

impl PostProcessorConfig {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }

    /// Whether this post-processor applies to a build named `build_name`.
    /// Mirrors [`ProvisionerConfig::applies_to`].
    pub fn applies_to(&self, build_name: &str) -> bool {
        if self.except.iter().any(|n| n == build_name) {
            return false;
        }
        if !self.only.is_empty() {
            return self.only.iter().any(|n| n == build_name);
        }
        true
    }
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
