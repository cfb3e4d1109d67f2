//! Filesystem-safe names for streams and topics.
//!
//! These names are the storage addressing scheme, so they must never change:
//! an archive written by one build has to stay readable by the next, and by
//! the other tools that already produce this layout.

use adler2::Adler32;

/// Width of the numeric topic prefix.
const TOPIC_PREFIX_DIGITS: usize = 5;
const TOPIC_PREFIX_MODULUS: u32 = 100_000;

/// Keep ASCII letters and digits, drop everything else.
pub fn sanitize(s: &str) -> String {
  s.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// Directory name for a stream: `"{stream_id}-{sanitized name}"`.
///
/// The id keeps two streams whose names sanitize identically apart.
pub fn sanitize_stream(stream_name: &str, stream_id: u64) -> String {
  format!("{}-{}", stream_id, sanitize(stream_name))
}

/// File stem for a topic: Adler-32 of the UTF-8 name modulo 10^5, zero-padded
/// to five digits, followed by the sanitized name.
///
/// The hash prefix keeps topics apart that differ only in punctuation or
/// non-ASCII characters.
pub fn sanitize_topic(topic_name: &str) -> String {
  let mut hasher = Adler32::new();
  hasher.write_slice(topic_name.as_bytes());
  let prefix = hasher.checksum() % TOPIC_PREFIX_MODULUS;
  format!("{:0width$}{}", prefix, sanitize(topic_name), width = TOPIC_PREFIX_DIGITS)
}
