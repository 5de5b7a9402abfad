//! Weight loading from safetensors files

use crate::nn::StateDict;
use crate::{Error, Result};
use ndarray::Array1;
use safetensors::tensor::Dtype;
use safetensors::SafeTensors;
use std::collections::HashMap;
use std::path::Path;

fn read(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| Error::Checkpoint {
        path: path.to_path_buf(),
        message: format!("failed to read: {e}"),
    })
}

/// Read a state dict written by [`save_state_dict`](super::save_state_dict)
///
/// Entries come back sorted by name. Tensors of any rank are flattened;
/// only `f32` tensors are accepted.
pub fn load_state_dict(path: impl AsRef<Path>) -> Result<StateDict> {
    let path = path.as_ref();
    let bytes = read(path)?;
    let tensors = SafeTensors::deserialize(&bytes).map_err(|e| Error::Checkpoint {
        path: path.to_path_buf(),
        message: format!("failed to deserialize: {e}"),
    })?;

    let mut named = tensors.tensors();
    named.sort_by(|a, b| a.0.cmp(&b.0));

    let mut state = StateDict::new();
    for (name, view) in named {
        if view.dtype() != Dtype::F32 {
            return Err(Error::Checkpoint {
                path: path.to_path_buf(),
                message: format!("tensor '{name}' has dtype {:?}, expected F32", view.dtype()),
            });
        }
        let values: Vec<f32> = match bytemuck::try_cast_slice::<u8, f32>(view.data()) {
            Ok(values) => values.to_vec(),
            // unaligned view
            Err(_) => view
                .data()
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        };
        state.insert(name, Array1::from(values));
    }
    Ok(state)
}

/// String metadata stored in the header of a safetensors file
pub fn load_metadata(path: impl AsRef<Path>) -> Result<HashMap<String, String>> {
    let path = path.as_ref();
    let bytes = read(path)?;
    let (_, metadata) = SafeTensors::read_metadata(&bytes).map_err(|e| Error::Checkpoint {
        path: path.to_path_buf(),
        message: format!("failed to read header: {e}"),
    })?;
    Ok(metadata.metadata().clone().unwrap_or_default())
}
