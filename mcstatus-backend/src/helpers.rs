/// Default Java Edition server port.
pub const JAVA_DEFAULT_PORT: u16 = 25565;

/// Default Bedrock Edition server port.
pub const BEDROCK_DEFAULT_PORT: u16 = 19132;

/// Cache partitions, one per kind of cached data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
  /// Java Edition status documents
  Java,
  /// Bedrock Edition status documents
  Bedrock,
  /// Decoded server icons
  Icon,
}

impl Namespace {
  pub fn prefix(self) -> &'static str {
    match self {
      Namespace::Java => "primary",
      Namespace::Bedrock => "second",
      Namespace::Icon => "icon",
    }
  }

  /// Cache key for a server. The host is used verbatim.
  pub fn key(self, host: &str, port: u16) -> String {
    format!("{}:{}-{}", self.prefix(), host, port)
  }
}
