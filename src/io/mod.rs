//! Model weight persistence
//!
//! Weights travel as a [`StateDict`](crate::nn::StateDict) of flat `f32`
//! arrays and are stored in the safetensors format.

mod load;
mod save;

pub use load::{load_metadata, load_state_dict};
pub use save::save_state_dict;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::StateDict;
    use crate::Error;
    use ndarray::arr1;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn sample() -> StateDict {
        let mut state = StateDict::new();
        state.insert("wide.wide_linear.weight", arr1(&[0.0, 0.25, -1.5, 3.0]));
        state.insert("wide.bias", arr1(&[0.125]));
        state.insert("deepdense.dense.dense_layer_0.bn.running_var", arr1(&[1.0, 2.0]));
        state
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.safetensors");
        save_state_dict(&path, &sample(), HashMap::new()).unwrap();

        let loaded = load_state_dict(&path).unwrap();
        assert_eq!(loaded.len(), 3);
        for (name, value) in sample().iter() {
            assert_eq!(loaded.get(name), Some(value), "entry {name}");
        }
    }

    #[test]
    fn test_loaded_entries_sorted_by_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.safetensors");
        save_state_dict(&path, &sample(), HashMap::new()).unwrap();

        let names: Vec<String> = load_state_dict(&path).unwrap().names().map(String::from).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_metadata_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/dir/model.safetensors");
        let meta = HashMap::from([("epoch".to_string(), "3".to_string())]);
        save_state_dict(&path, &sample(), meta).unwrap();

        let read = load_metadata(&path).unwrap();
        assert_eq!(read.get("epoch").map(String::as_str), Some("3"));
    }

    #[test]
    fn test_missing_file_is_checkpoint_error() {
        let dir = TempDir::new().unwrap();
        let err = load_state_dict(dir.path().join("absent.safetensors")).unwrap_err();
        assert!(matches!(err, Error::Checkpoint { .. }));
    }

    #[test]
    fn test_garbage_file_is_checkpoint_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.safetensors");
        std::fs::write(&path, b"not a safetensors file").unwrap();
        assert!(matches!(load_state_dict(&path), Err(Error::Checkpoint { .. })));
    }
}
