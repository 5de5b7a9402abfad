//! Weight saving in the safetensors format

use crate::nn::StateDict;
use crate::{Error, Result};
use safetensors::tensor::{Dtype, TensorView};
use std::collections::HashMap;
use std::path::Path;

/// Write a state dict as a safetensors file
///
/// Every entry is stored as a 1-D little-endian `f32` tensor under its
/// dotted name. `metadata` lands in the file header.
///
/// # Example
///
/// ```no_run
/// use widedeep::io::save_state_dict;
/// use widedeep::nn::StateDict;
/// use ndarray::arr1;
/// use std::collections::HashMap;
///
/// let mut state = StateDict::new();
/// state.insert("wide.bias", arr1(&[0.5]));
/// save_state_dict("weights.safetensors", &state, HashMap::new()).unwrap();
/// ```
pub fn save_state_dict(
    path: impl AsRef<Path>,
    state: &StateDict,
    metadata: HashMap<String, String>,
) -> Result<()> {
    let path = path.as_ref();

    let tensor_data: Vec<(&str, Vec<u8>, Vec<usize>)> = state
        .iter()
        .map(|(name, value)| {
            let bytes: Vec<u8> =
                bytemuck::cast_slice(value.as_slice().expect("contiguous")).to_vec();
            (name, bytes, vec![value.len()])
        })
        .collect();

    let views = tensor_data
        .iter()
        .map(|(name, bytes, shape)| {
            TensorView::new(Dtype::F32, shape.clone(), bytes)
                .map(|view| (*name, view))
                .map_err(|e| Error::Serialization(format!("tensor '{name}': {e}")))
        })
        .collect::<Result<Vec<_>>>()?;

    let metadata = (!metadata.is_empty()).then_some(metadata);
    let bytes = safetensors::serialize(views, metadata)
        .map_err(|e| Error::Serialization(format!("SafeTensors serialization failed: {e}")))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}
