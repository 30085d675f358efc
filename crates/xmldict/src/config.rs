//! Conversion settings

/// Key used for character data on elements that also carry attributes or children
pub const DEFAULT_TEXT_KEY: &str = "text";

/// What to do with an element whose only content is whitespace
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WhitespacePolicy {
    /// `<a>  </a>` becomes `""`
    #[default]
    Trim,
    /// `<a>  </a>` becomes `"  "`
    Preserve,
}

/// How to resolve two explicit sources writing the same key of one element
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// The explicit value wins over synthesized text, a child element
    /// replaces a same-named attribute; a warning is logged either way
    #[default]
    Overwrite,
    /// Fail with `ErrorKind::KeyCollisionAmbiguous`
    Error,
}

/// Configuration for tokenizing and building
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Maximum element nesting depth (0 means unlimited)
    pub max_depth: u16,
    /// Maximum input size in bytes (0 means unlimited)
    pub max_size: usize,
    /// Reserved key for synthesized text
    pub text_key: String,
    /// Prepended to every attribute name
    pub attribute_prefix: String,
    pub whitespace: WhitespacePolicy,
    pub collisions: CollisionPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: 0,
            max_size: 0,
            text_key: DEFAULT_TEXT_KEY.to_string(),
            attribute_prefix: String::new(),
            whitespace: WhitespacePolicy::default(),
            collisions: CollisionPolicy::default(),
        }
    }
}

impl Config {
    /// Default configuration with explicit tokenizer limits
    pub fn with_limits(max_depth: u16, max_size: usize) -> Self {
        Self {
            max_depth,
            max_size,
            ..Self::default()
        }
    }

    pub fn text_key(mut self, key: impl Into<String>) -> Self {
        self.text_key = key.into();
        self
    }

    pub fn attribute_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.attribute_prefix = prefix.into();
        self
    }

    pub const fn whitespace(mut self, policy: WhitespacePolicy) -> Self {
        self.whitespace = policy;
        self
    }

    pub const fn collisions(mut self, policy: CollisionPolicy) -> Self {
        self.collisions = policy;
        self
    }

    /// Key an attribute named `name` is stored under
    pub(crate) fn attribute_key(&self, name: &str) -> String {
        if self.attribute_prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}{}", self.attribute_prefix, name)
        }
    }
}
