// Framer - sentinel detection over the inbound byte stream

/// Banner the controller prints before asking for a user name
pub const LOGIN: &[u8] = b"login:";
/// Monitor prompt, printed whenever the shell is ready for a command
pub const PROMPT: &[u8] = b">";
/// Line terminator used in both directions
pub const LINE_END: &[u8] = b"\r\n";

/// Ordered set of byte sequences that end a logical read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelSet {
    sentinels: Vec<Vec<u8>>,
}

impl SentinelSet {
    pub fn from_slices(sentinels: &[&[u8]]) -> Self {
        Self {
            sentinels: sentinels.iter().map(|s| s.to_vec()).collect(),
        }
    }

    /// Handshake stage one
    pub fn login() -> Self {
        Self::from_slices(&[LOGIN])
    }

    /// Handshake stage two, and the end of every command response
    pub fn prompt() -> Self {
        Self::from_slices(&[PROMPT])
    }

    /// A full line or a prompt, whichever shows up first
    pub fn response() -> Self {
        Self::from_slices(&[LINE_END, PROMPT])
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.sentinels.iter().map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.sentinels.is_empty()
    }
}

impl std::fmt::Display for SentinelSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<String> = self
            .iter()
            .map(|s| format!("{:?}", String::from_utf8_lossy(s)))
            .collect();
        write!(f, "[{}]", rendered.join(", "))
    }
}

/// True iff any sentinel occurs anywhere in `buffer`.
///
/// The whole buffer is rescanned on every call; responses are a few KB at most.
pub fn matches(buffer: &[u8], sentinels: &SentinelSet) -> bool {
    sentinels.iter().any(|sentinel| contains(buffer, sentinel))
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() || needle.len() > haystack.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|window| window == needle)
}

/// Decode controller output for display.
///
/// Invalid UTF-8 is replaced rather than rejected and NUL padding is dropped.
pub fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).replace('\0', "")
}

/// Split decoded text into lines on `\r\n` (a bare `\n` is accepted too)
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line))
}
