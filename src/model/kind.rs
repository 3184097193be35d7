//! Patch-chain roles of a change
//!
//! A change's role is decided by its description: `[PATCH] <name>` marks a
//! patch commit, a description containing `QUAHOG` marks the base commit.
//! Only mutable changes can play either role.

/// Prefix of a patch commit's description
pub const PATCH_MARKER: &str = "[PATCH]";

/// Keyword identifying the base commit
pub const BASE_MARKER: &str = "QUAHOG";

/// Extension appended to patch names that carry none of [`PATCH_EXTENSIONS`]
pub const DEFAULT_PATCH_EXTENSION: &str = ".patch";

/// Extensions accepted as-is on patch names
pub const PATCH_EXTENSIONS: [&str; 2] = [".patch", ".diff"];

/// Role of a change in a patch chain
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChangeKind {
    /// One quilt patch
    Patch(PatchMeta),
    /// The folded state of the series
    Base,
    /// Anything else
    #[default]
    Plain,
}

impl ChangeKind {
    /// Classify a description. Patch takes precedence over base.
    pub fn classify(description: &str, is_mutable: bool) -> Self {
        if !is_mutable {
            return Self::Plain;
        }
        if let Some(meta) = PatchMeta::parse(description) {
            Self::Patch(meta)
        } else if description.contains(BASE_MARKER) {
            Self::Base
        } else {
            Self::Plain
        }
    }

    pub fn as_patch(&self) -> Option<&PatchMeta> {
        match self {
            Self::Patch(meta) => Some(meta),
            _ => None,
        }
    }
}

/// Patch file name and header comment carried by a patch commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchMeta {
    /// File name under `patches/`; just the extension when the marker has no
    /// title
    pub name: String,
    /// Free text after the title line, used as the patch file header
    pub description: String,
}

impl PatchMeta {
    /// Parse a patch commit description.
    ///
    /// Returns `None` when the description does not start with
    /// [`PATCH_MARKER`].
    pub fn parse(description: &str) -> Option<Self> {
        let mut lines = description.lines();
        let title = lines.next()?.strip_prefix(PATCH_MARKER)?.trim();

        let mut name = title.replace(' ', "-");
        if !PATCH_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
            name.push_str(DEFAULT_PATCH_EXTENSION);
        }

        let body: Vec<&str> = lines.skip_while(|line| line.trim().is_empty()).collect();
        let description = body.join("\n").trim_end().to_string();

        Some(Self { name, description })
    }

    /// Description for a patch commit recreated from a patch file
    pub fn commit_message(name: &str, description: &str) -> String {
        if description.is_empty() {
            format!("{PATCH_MARKER} {name}")
        } else {
            format!("{PATCH_MARKER} {name}\n\n{description}")
        }
    }
}
