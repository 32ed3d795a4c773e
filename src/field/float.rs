use crate::{
    array::{ArrayKind, ArrayRef, FloatArray},
    config::FieldConfig,
    field::{existing_array, FieldCore, FieldFactory, FieldValue},
    memo::ReadMemo,
    store::Group,
    Result,
};

/// Numeric field, one value ([`FieldValue::Floats`]) or one row ([`FieldValue::Rows`]) per
/// observation.
#[derive(Debug, Clone)]
pub struct FloatField {
    core: FieldCore,
}

impl FieldFactory for FloatField {
    const TAG: &'static str = "float";

    fn construct(
        num_obs: usize,
        name: &str,
        value: FieldValue,
        config: &FieldConfig,
    ) -> Result<Self> {
        let data = match value {
            FieldValue::Floats(values) => ArrayRef::new(FloatArray::new(values)),
            FieldValue::Rows(rows) => ArrayRef::new(FloatArray::from_rows(&rows)?),
            other => existing_array(Self::TAG, ArrayKind::Float, &other)?,
        };

        Ok(FloatField {
            core: FieldCore::new(num_obs, name, data, config)?,
        })
    }

    fn read(group: &Group, memo: &mut ReadMemo) -> Result<Self> {
        let core = FieldCore::read(group, memo)?;
        core.expect_kind(ArrayKind::Float)?;
        Ok(FloatField { core })
    }
}

super::impl_field_type!(FloatField, <FloatField as FieldFactory>::TAG);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{array::TextArray, field::FieldType, Error};

    #[test]
    fn test_rows() {
        let field = FloatField::construct(
            2,
            "covariance",
            FieldValue::Rows(vec![vec![1.0, 0.1], vec![0.1, 1.0]]),
            &FieldConfig::new(),
        )
        .unwrap();
        assert_eq!(field.data().shape(), vec![2, 2]);
    }

    #[test]
    fn test_length_mismatch() {
        let result = FloatField::construct(
            3,
            "residual",
            FieldValue::Floats(vec![1.0]),
            &FieldConfig::new(),
        );
        match result {
            Err(Error::Shape { left, right, .. }) => {
                assert_eq!(left, "1");
                assert_eq!(right, "3");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_wrong_value() {
        let result = FloatField::construct(
            1,
            "residual",
            FieldValue::Bools(vec![true]),
            &FieldConfig::new(),
        );
        assert!(matches!(
            result,
            Err(Error::Initialization { parameter, .. }) if parameter == "value"
        ));

        let text = ArrayRef::new(TextArray::new(vec!["a".to_string()]));
        let result = FloatField::construct(1, "residual", text.into(), &FieldConfig::new());
        assert!(matches!(result, Err(Error::Initialization { .. })));
    }
}
