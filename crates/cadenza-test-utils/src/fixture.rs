// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WAT plugin fixtures.
//!
//! A fixture is a module whose `plugin_info` hands back a fixed definition
//! and whose capability exports hand back fixed JSON, so tests can script
//! plugin behavior without a toolchain.

use std::path::{Path, PathBuf};

use cadenza_core::Capability;

enum Body {
    Output(String),
    Trap,
}

/// Builder for a scripted plugin module.
pub struct PluginFixture {
    name: String,
    version: Option<String>,
    src_url: Option<String>,
    app_version: Option<String>,
    author: Option<String>,
    trap_info: bool,
    revision: u32,
    exports: Vec<(Capability, Body)>,
}

impl PluginFixture {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            src_url: None,
            app_version: None,
            author: None,
            trap_info: false,
            revision: 0,
            exports: Vec::new(),
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn src_url(mut self, url: impl Into<String>) -> Self {
        self.src_url = Some(url.into());
        self
    }

    pub fn app_version(mut self, req: impl Into<String>) -> Self {
        self.app_version = Some(req.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Makes `plugin_info` trap instead of describing the plugin.
    pub fn trapping(mut self) -> Self {
        self.trap_info = true;
        self
    }

    /// Changes the module bytes without changing anything observable.
    pub fn revision(mut self, revision: u32) -> Self {
        self.revision = revision;
        self
    }

    /// Exports `capability`, answering every call with `output`.
    pub fn with_capability(mut self, capability: Capability, output: impl Into<String>) -> Self {
        self.exports.push((capability, Body::Output(output.into())));
        self
    }

    /// Exports `capability` with a body that traps.
    pub fn with_trapping_capability(mut self, capability: Capability) -> Self {
        self.exports.push((capability, Body::Trap));
        self
    }

    /// The `plugin_info` JSON this fixture reports.
    pub fn info_json(&self) -> String {
        let mut info = serde_json::Map::new();
        info.insert("name".into(), self.name.clone().into());
        let optional = [
            ("version", &self.version),
            ("srcUrl", &self.src_url),
            ("appVersion", &self.app_version),
            ("author", &self.author),
        ];
        for (key, value) in optional {
            if let Some(v) = value {
                info.insert(key.into(), v.clone().into());
            }
        }
        serde_json::Value::Object(info).to_string()
    }

    pub fn to_wat(&self) -> String {
        let mut data = String::new();
        let mut funcs = String::new();
        let mut offset = 0usize;

        let mut emit = |export: &str, body: &Body| match body {
            Body::Trap => {
                funcs.push_str(&format!("  (func (export \"{export}\") unreachable)\n"));
            }
            Body::Output(out) => {
                data.push_str(&format!(
                    "  (data (i32.const {offset}) \"{}\")\n",
                    escape(out.as_bytes())
                ));
                funcs.push_str(&format!(
                    "  (func (export \"{export}\") (call $set_output (i32.const {offset}) (i32.const {})))\n",
                    out.len()
                ));
                offset += out.len();
            }
        };

        let info = if self.trap_info {
            Body::Trap
        } else {
            Body::Output(self.info_json())
        };
        emit("plugin_info", &info);
        for (capability, body) in &self.exports {
            emit(capability.as_ref(), body);
        }

        let pages = offset.div_ceil(65536).max(1);
        format!(
            "(module\n  \
             (import \"cadenza\" \"set_output\" (func $set_output (param i32 i32)))\n  \
             (memory (export \"memory\") {pages})\n  \
             (global (export \"revision\") i32 (i32.const {}))\n\
             {data}{funcs})\n",
            self.revision
        )
    }

    /// The binary encoding of [`to_wat`](Self::to_wat).
    pub fn to_wasm(&self) -> Vec<u8> {
        wat::parse_str(self.to_wat()).expect("fixture WAT is valid")
    }

    /// Writes the text form to `dir/file_name` and returns the path.
    pub fn write_wat(&self, dir: &Path, file_name: &str) -> PathBuf {
        let path = dir.join(file_name);
        std::fs::write(&path, self.to_wat()).expect("write fixture");
        path
    }
}

fn escape(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        if (0x20..0x7f).contains(&b) && b != b'"' && b != b'\\' {
            out.push(b as char);
        } else {
            out.push_str(&format!("\\{b:02x}"));
        }
    }
    out
}
