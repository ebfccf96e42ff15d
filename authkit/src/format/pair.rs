use super::DecodeError;
use super::EncodeError;
use super::Reads;
use super::Writes;

/// A [`Format`](super::Format) assembled from a separate reader and writer.
///
/// Useful when the two directions come from different places, e.g. a
/// verifying reader backed by a public key and a writer owned by the issuer.
#[derive(Debug, Clone)]
pub struct FormatPair<R, W> {
    reads: R,
    writes: W,
}

impl<R, W> FormatPair<R, W> {
    pub fn new(reads: R, writes: W) -> Self {
        Self { reads, writes }
    }

    pub fn reads(&self) -> &R {
        &self.reads
    }

    pub fn writes(&self) -> &W {
        &self.writes
    }

    /// Swap the reading direction, keeping the writer.
    pub fn with_reads<R2>(self, reads: R2) -> FormatPair<R2, W> {
        FormatPair {
            reads,
            writes: self.writes,
        }
    }

    /// Swap the writing direction, keeping the reader.
    pub fn with_writes<W2>(self, writes: W2) -> FormatPair<R, W2> {
        FormatPair {
            reads: self.reads,
            writes,
        }
    }
}

impl<T, R, W> Reads<T> for FormatPair<R, W>
where
    R: Reads<T>,
{
    fn read(&self, token: &str) -> Result<T, DecodeError> {
        self.reads.read(token)
    }
}

impl<T, R, W> Writes<T> for FormatPair<R, W>
where
    W: Writes<T>,
{
    fn write(&self, value: &T) -> Result<String, EncodeError> {
        self.writes.write(value)
    }
}
