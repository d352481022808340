use std::collections::BTreeMap;

/// Element type of an auxiliary stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// 32-bit floats.
    Float,
    /// 32-bit signed integers.
    Int,
    /// Booleans.
    Bool,
}

/// Flat, entry-major stream payload.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum StreamData {
    /// Float payload.
    Float(Vec<f32>),
    /// Integer payload.
    Int(Vec<i32>),
    /// Boolean payload.
    Bool(Vec<bool>),
}

impl StreamData {
    /// Element kind of this payload.
    pub fn kind(&self) -> StreamKind {
        match self {
            StreamData::Float(_) => StreamKind::Float,
            StreamData::Int(_) => StreamKind::Int,
            StreamData::Bool(_) => StreamKind::Bool,
        }
    }

    /// Number of elements across all entries.
    pub fn len(&self) -> usize {
        match self {
            StreamData::Float(v) => v.len(),
            StreamData::Int(v) => v.len(),
            StreamData::Bool(v) => v.len(),
        }
    }

    /// Return `true` when the payload holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn pad(&mut self, n: usize) {
        match self {
            StreamData::Float(v) => v.resize(v.len() + n, 0.0),
            StreamData::Int(v) => v.resize(v.len() + n, 0),
            StreamData::Bool(v) => v.resize(v.len() + n, false),
        }
    }
}

/// Scalar types that can be written into a [`BatchOutputContext`].
pub trait StreamScalar: Copy + private::Sealed {
    /// Stream kind produced by this scalar.
    const KIND: StreamKind;

    #[doc(hidden)]
    fn empty() -> StreamData;

    #[doc(hidden)]
    fn extend(data: &mut StreamData, values: &[Self]);
}

mod private {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for i32 {}
    impl Sealed for bool {}
}

macro_rules! impl_stream_scalar {
    ($ty:ty, $kind:ident) => {
        impl StreamScalar for $ty {
            const KIND: StreamKind = StreamKind::$kind;

            fn empty() -> StreamData {
                StreamData::$kind(Vec::new())
            }

            fn extend(data: &mut StreamData, values: &[Self]) {
                if let StreamData::$kind(v) = data {
                    v.extend_from_slice(values);
                }
            }
        }
    };
}

impl_stream_scalar!(f32, Float);
impl_stream_scalar!(i32, Int);
impl_stream_scalar!(bool, Bool);

/// One finalized auxiliary stream.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AuxiliaryStream {
    /// Stream name as written by scene components.
    pub name: String,
    /// Elements per entry.
    pub width: usize,
    /// Entry-major payload of `width * batch_size` elements.
    pub data: StreamData,
}

#[derive(Debug)]
struct StreamBuffer {
    width: usize,
    next_entry: usize,
    data: StreamData,
}

/// Per-batch accumulator of named auxiliary streams.
///
/// Writes always target the current entry. The first write to a name must happen at entry 0 and
/// fixes the stream's width; later writes must match it. Invalid writes are logged and discarded
/// so one misbehaving component never aborts a batch.
#[derive(Debug, Default)]
pub struct BatchOutputContext {
    cursor: usize,
    streams: BTreeMap<String, StreamBuffer>,
    discarded: u64,
}

impl BatchOutputContext {
    /// Create an empty context positioned at entry 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry index that writes currently target.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of writes rejected so far.
    pub fn discarded_writes(&self) -> u64 {
        self.discarded
    }

    /// Declared width of a stream, if it exists.
    pub fn stream_width(&self, name: &str) -> Option<usize> {
        self.streams.get(name).map(|s| s.width)
    }

    /// Write one scalar for the current entry.
    pub fn output_value<T: StreamScalar>(&mut self, name: &str, value: T) -> bool {
        self.output_vector(name, &[value])
    }

    /// Write a vector of scalars for the current entry.
    ///
    /// Returns `false` when the write was rejected (and logged).
    pub fn output_vector<T: StreamScalar>(&mut self, name: &str, values: &[T]) -> bool {
        let entry = self.cursor;
        if values.is_empty() {
            return self.reject(name, entry, "empty write");
        }

        let Some(stream) = self.streams.get_mut(name) else {
            if entry != 0 {
                return self.reject(name, entry, "first write must happen at entry 0");
            }
            let mut data = T::empty();
            T::extend(&mut data, values);
            self.streams.insert(
                name.to_owned(),
                StreamBuffer {
                    width: values.len(),
                    next_entry: 1,
                    data,
                },
            );
            return true;
        };

        if stream.data.kind() != T::KIND {
            let declared = stream.data.kind();
            return self.reject(
                name,
                entry,
                &format!("kind mismatch: declared {declared:?}, got {:?}", T::KIND),
            );
        }
        if stream.width != values.len() {
            let declared = stream.width;
            return self.reject(
                name,
                entry,
                &format!(
                    "width mismatch: declared {declared}, got {}",
                    values.len()
                ),
            );
        }
        if stream.next_entry > entry {
            return self.reject(name, entry, "entry already written");
        }
        if stream.next_entry < entry {
            let missing = entry - stream.next_entry;
            tracing::warn!(stream = name, entry, missing, "stream skipped entries; padding");
            stream.data.pad(missing * stream.width);
        }

        T::extend(&mut stream.data, values);
        stream.next_entry = entry + 1;
        true
    }

    /// Move the write cursor to the next entry.
    pub fn advance(&mut self) {
        self.cursor += 1;
    }

    /// Flatten every stream entry-major for `batch_size` entries.
    ///
    /// Streams that never reached the final entry are padded with default values so consumers can
    /// still reshape them as `[batch_size][width]`.
    pub fn finalize(self, batch_size: usize) -> Vec<AuxiliaryStream> {
        self.streams
            .into_iter()
            .map(|(name, mut stream)| {
                if stream.next_entry < batch_size {
                    let missing = batch_size - stream.next_entry;
                    tracing::warn!(stream = %name, missing, "stream incomplete at finalize; padding");
                    stream.data.pad(missing * stream.width);
                }
                AuxiliaryStream {
                    name,
                    width: stream.width,
                    data: stream.data,
                }
            })
            .collect()
    }

    fn reject(&mut self, name: &str, entry: usize, reason: &str) -> bool {
        self.discarded += 1;
        tracing::error!(stream = name, entry, reason, "discarding auxiliary output write");
        false
    }
}

#[cfg(test)]
#[path = "../../tests/unit/output/context.rs"]
mod tests;
