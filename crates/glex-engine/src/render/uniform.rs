use std::collections::BTreeMap;

use crate::error::{EngineError, EngineResult};

/// A float uniform value, shaped by its component count.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    /// Column-major 4x4 matrix.
    Mat4([f32; 16]),
}

/// Named uniform values, applied in name order.
pub type UniformMap = BTreeMap<String, UniformValue>;

impl UniformValue {
    /// Builds a value from a flat slice of 1, 2, 3, 4 or 16 floats.
    pub fn from_slice(values: &[f32]) -> EngineResult<Self> {
        Ok(match *values {
            [x] => Self::Float(x),
            [x, y] => Self::Vec2([x, y]),
            [x, y, z] => Self::Vec3([x, y, z]),
            [x, y, z, w] => Self::Vec4([x, y, z, w]),
            _ => match <[f32; 16]>::try_from(values) {
                Ok(m) => Self::Mat4(m),
                Err(_) => {
                    return Err(EngineError::invalid(format!(
                        "uniform needs 1, 2, 3, 4 or 16 floats, got {}",
                        values.len()
                    )));
                }
            },
        })
    }

    pub fn as_slice(&self) -> &[f32] {
        match self {
            Self::Float(v) => std::slice::from_ref(v),
            Self::Vec2(v) => v,
            Self::Vec3(v) => v,
            Self::Vec4(v) => v,
            Self::Mat4(v) => v,
        }
    }

    pub fn components(&self) -> usize {
        self.as_slice().len()
    }
}

impl TryFrom<&[f32]> for UniformValue {
    type Error = EngineError;

    fn try_from(values: &[f32]) -> EngineResult<Self> {
        Self::from_slice(values)
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(v: [f32; 2]) -> Self {
        Self::Vec2(v)
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(v: [f32; 4]) -> Self {
        Self::Vec4(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_follows_length() {
        assert_eq!(UniformValue::from_slice(&[1.0]).unwrap(), UniformValue::Float(1.0));
        assert_eq!(
            UniformValue::from_slice(&[1.0, 2.0, 3.0]).unwrap(),
            UniformValue::Vec3([1.0, 2.0, 3.0])
        );
        let m: Vec<f32> = (0..16).map(|i| i as f32).collect();
        let v = UniformValue::try_from(m.as_slice()).unwrap();
        assert!(matches!(v, UniformValue::Mat4(_)));
        assert_eq!(v.as_slice(), m.as_slice());
    }

    #[test]
    fn unsupported_lengths_are_rejected() {
        for len in [0usize, 5, 9, 15, 17] {
            let values = vec![0.0; len];
            let err = UniformValue::from_slice(&values).unwrap_err();
            assert!(matches!(err, EngineError::InvalidArgument(_)), "len {len}");
        }
    }

    #[test]
    fn component_counts() {
        assert_eq!(UniformValue::from(0.5).components(), 1);
        assert_eq!(UniformValue::from([0.0, 1.0]).components(), 2);
        assert_eq!(UniformValue::from([0.0; 4]).components(), 4);
    }
}
