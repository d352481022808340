use std::collections::BTreeMap;

use crate::{
    capture::format::deinterleave_depth_normals,
    output::context::{AuxiliaryStream, StreamData},
    service::response::BatchRenderResponse,
};

/// A dense row-major array.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor<T> {
    pub shape: Vec<usize>,
    pub data: Vec<T>,
}

impl<T> Tensor<T> {
    pub fn new(shape: Vec<usize>, data: Vec<T>) -> Self {
        Self { shape, data }
    }

    /// Elements in one slice along the first axis.
    pub fn stride(&self) -> usize {
        self.shape.iter().skip(1).product()
    }

    /// Slice `i` along the first axis.
    pub fn item(&self, i: usize) -> Option<&[T]> {
        let n = self.stride();
        self.data.get(i * n..(i + 1) * n)
    }
}

/// One named array of a decoded batch.
#[derive(Clone, Debug, PartialEq)]
pub enum DatasetValue {
    /// `[batch, height, width, channels]` colour or `[batch, height, width]` segmentation.
    U8(Tensor<u8>),
    /// Depth `[batch, height, width]`, normals `[batch, height, width, 3]` or float streams.
    F32(Tensor<f32>),
    I32(Tensor<i32>),
    Bool(Tensor<bool>),
}

impl DatasetValue {
    pub fn shape(&self) -> &[usize] {
        match self {
            DatasetValue::U8(t) => &t.shape,
            DatasetValue::F32(t) => &t.shape,
            DatasetValue::I32(t) => &t.shape,
            DatasetValue::Bool(t) => &t.shape,
        }
    }

    pub fn as_u8(&self) -> Option<&Tensor<u8>> {
        match self {
            DatasetValue::U8(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<&Tensor<f32>> {
        match self {
            DatasetValue::F32(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<&Tensor<i32>> {
        match self {
            DatasetValue::I32(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<&Tensor<bool>> {
        match self {
            DatasetValue::Bool(t) => Some(t),
            _ => None,
        }
    }
}

/// A batch response decoded into named arrays.
///
/// Keys are `<camera>` for colour, `<camera>_depth`, `<camera>_normals` and
/// `<camera>_segmentation` for the optional products, plus one key per auxiliary stream.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchDataset {
    batch_size: usize,
    values: BTreeMap<String, DatasetValue>,
}

impl BatchDataset {
    pub fn from_response(resp: &BatchRenderResponse) -> Self {
        let (b, h, w) = (resp.batch_size, resp.height as usize, resp.width as usize);
        let mut values = BTreeMap::new();

        for stream in &resp.streams {
            let channels = stream.color_format.bytes_per_pixel();
            let color: Vec<u8> = stream
                .entries
                .iter()
                .flat_map(|e| e.color.iter().copied())
                .collect();
            values.insert(
                stream.name.clone(),
                DatasetValue::U8(Tensor::new(vec![b, h, w, channels], color)),
            );

            let packed: Vec<&[u8]> = stream
                .entries
                .iter()
                .filter_map(|e| e.depth_normals.as_deref())
                .collect();
            if !packed.is_empty() {
                let mut depth = Vec::with_capacity(b * h * w);
                let mut normals = Vec::with_capacity(b * h * w * 3);
                for bytes in &packed {
                    let (d, n) = deinterleave_depth_normals(bytes);
                    depth.extend(d);
                    normals.extend(n);
                }
                let n = packed.len();
                values.insert(
                    format!("{}_depth", stream.name),
                    DatasetValue::F32(Tensor::new(vec![n, h, w], depth)),
                );
                values.insert(
                    format!("{}_normals", stream.name),
                    DatasetValue::F32(Tensor::new(vec![n, h, w, 3], normals)),
                );
            }

            let seg: Vec<&[u8]> = stream
                .entries
                .iter()
                .filter_map(|e| e.segmentation.as_deref())
                .collect();
            if !seg.is_empty() {
                let n = seg.len();
                values.insert(
                    format!("{}_segmentation", stream.name),
                    DatasetValue::U8(Tensor::new(vec![n, h, w], seg.concat())),
                );
            }
        }

        for aux in &resp.auxiliary {
            if let Some(v) = reshape_auxiliary(aux, b) {
                values.insert(aux.name.clone(), v);
            }
        }

        Self {
            batch_size: b,
            values,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn get(&self, name: &str) -> Option<&DatasetValue> {
        self.values.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn reshape_auxiliary(aux: &AuxiliaryStream, batch_size: usize) -> Option<DatasetValue> {
    let len = aux.data.len();
    if batch_size == 0 || len % batch_size != 0 {
        tracing::warn!(stream = %aux.name, len, batch_size, "auxiliary stream skipped");
        return None;
    }
    let shape = vec![batch_size, len / batch_size];
    Some(match &aux.data {
        StreamData::Float(v) => DatasetValue::F32(Tensor::new(shape, v.clone())),
        StreamData::Int(v) => DatasetValue::I32(Tensor::new(shape, v.clone())),
        StreamData::Bool(v) => DatasetValue::Bool(Tensor::new(shape, v.clone())),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/client/dataset.rs"]
mod tests;
