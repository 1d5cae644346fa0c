//! Model loading utilities for safetensors format.

use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use safetensors::SafeTensors;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Loads weights from `path` and builds a model from them.
///
/// Intended to run once at startup: any failure here should abort the
/// process rather than surface per request.
///
/// # Errors
///
/// Returns an error naming the file if it cannot be read or parsed, or if the
/// builder rejects the weights.
pub fn load_model<T>(
    path: impl AsRef<Path>,
    device: &Device,
    builder: impl FnOnce(VarBuilder<'static>) -> Result<T>,
) -> Result<T> {
    let path = path.as_ref();
    let vb = load_safetensors(path, device)?;
    let model =
        builder(vb).with_context(|| format!("Invalid model weights in {}", path.display()))?;
    info!("Loaded model {}", path.display());
    Ok(model)
}

/// Loads a safetensors file and creates a `VarBuilder` for the model.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read
/// - The safetensors data is invalid
pub fn load_safetensors(path: impl AsRef<Path>, device: &Device) -> Result<VarBuilder<'static>> {
    let path = path.as_ref();
    debug!("Loading safetensors from {}", path.display());

    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read model file: {}", path.display()))?;

    let tensors = SafeTensors::deserialize(&data)
        .with_context(|| format!("Failed to parse safetensors: {}", path.display()))?;

    let mut tensor_map: HashMap<String, Tensor> = HashMap::new();

    for name in tensors.names() {
        let tensor_view = tensors
            .tensor(name)
            .with_context(|| format!("Failed to get tensor '{name}'"))?;

        let dtype = safetensors_dtype_to_candle(tensor_view.dtype())?;
        let shape: Vec<usize> = tensor_view.shape().to_vec();

        let tensor = Tensor::from_raw_buffer(tensor_view.data(), dtype, &shape, device)
            .with_context(|| format!("Failed to create tensor '{name}'"))?;

        tensor_map.insert(name.clone(), tensor);
    }

    Ok(VarBuilder::from_tensors(tensor_map, DType::F32, device))
}

/// Converts safetensors dtype to candle dtype.
fn safetensors_dtype_to_candle(dtype: safetensors::Dtype) -> Result<DType> {
    use safetensors::Dtype as S;
    match dtype {
        S::F32 => Ok(DType::F32),
        S::F64 => Ok(DType::F64),
        S::F16 => Ok(DType::F16),
        S::BF16 => Ok(DType::BF16),
        S::I64 => Ok(DType::I64),
        S::U8 => Ok(DType::U8),
        S::U32 => Ok(DType::U32),
        other => anyhow::bail!("Unsupported dtype: {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[allow(clippy::expect_used)]
    fn create_test_safetensors() -> NamedTempFile {
        use safetensors::serialize;
        use safetensors::tensor::TensorView;

        let data: Vec<f32> = vec![1.0, 2.0, 3.0, 4.0];
        let data_bytes: &[u8] = bytemuck::cast_slice(&data);

        let tensor = TensorView::new(safetensors::Dtype::F32, vec![2, 2], data_bytes)
            .expect("valid tensor view");

        let tensors = HashMap::from([("test_tensor".to_string(), tensor)]);
        let serialized = serialize(&tensors, &None).expect("serialize");

        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(&serialized).expect("write");
        file
    }

    #[test]
    fn test_load_safetensors() {
        let file = create_test_safetensors();
        let result = load_safetensors(file.path(), &Device::Cpu);
        assert!(result.is_ok());
    }

    #[test]
    fn test_load_safetensors_missing_file() {
        let result = load_safetensors("/nonexistent/path.safetensors", &Device::Cpu);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_model_runs_builder() {
        let file = create_test_safetensors();
        let sum = load_model(file.path(), &Device::Cpu, |vb| {
            let t = vb.get((2, 2), "test_tensor")?;
            Ok(t.sum_all()?.to_scalar::<f32>()?)
        });
        assert!(matches!(sum, Ok(s) if (s - 10.0).abs() < 1e-6));
    }

    #[test]
    fn test_load_model_reports_missing_tensor() {
        let file = create_test_safetensors();
        let result = load_model(file.path(), &Device::Cpu, |vb| {
            Ok(vb.get((2, 2), "missing")?.dims().len())
        });
        let err = result.err().map(|e| format!("{e:#}")).unwrap_or_default();
        assert!(err.contains("Invalid model weights"), "{err}");
    }
}
