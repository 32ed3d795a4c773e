use crate::{
    array::{ArrayKind, ArrayRef, TextArray},
    config::FieldConfig,
    field::{existing_array, FieldCore, FieldFactory, FieldValue},
    memo::ReadMemo,
    store::Group,
    Result,
};

/// String field, e.g. station or satellite names
#[derive(Debug, Clone)]
pub struct TextField {
    core: FieldCore,
}

impl FieldFactory for TextField {
    const TAG: &'static str = "text";

    fn construct(
        num_obs: usize,
        name: &str,
        value: FieldValue,
        config: &FieldConfig,
    ) -> Result<Self> {
        let data = match value {
            FieldValue::Text(values) => ArrayRef::new(TextArray::new(values)),
            other => existing_array(Self::TAG, ArrayKind::Text, &other)?,
        };

        Ok(TextField {
            core: FieldCore::new(num_obs, name, data, config)?,
        })
    }

    fn read(group: &Group, memo: &mut ReadMemo) -> Result<Self> {
        let core = FieldCore::read(group, memo)?;
        core.expect_kind(ArrayKind::Text)?;
        Ok(TextField { core })
    }
}

super::impl_field_type!(TextField, <TextField as FieldFactory>::TAG);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        array::PlotValues,
        field::{FieldType, FloatField},
        memo::{MutationMemo, WriteMemo},
    };

    #[test]
    fn test_subset_repeats() {
        let mut field = TextField::construct(
            2,
            "station",
            FieldValue::Text(vec!["osls".to_string(), "hons".to_string()]),
            &FieldConfig::new(),
        )
        .unwrap();
        field.subset(&[1, 1, 0], &mut MutationMemo::new()).unwrap();
        assert_eq!(
            field.plot_values(None).unwrap(),
            PlotValues::Text(vec![
                "hons".to_string(),
                "hons".to_string(),
                "osls".to_string()
            ])
        );
    }

    #[test]
    fn test_read_rejects_other_kind() {
        let mut group = Group::new();
        FloatField::construct(
            1,
            "station",
            FieldValue::Floats(vec![1.0]),
            &FieldConfig::new(),
        )
        .unwrap()
        .write(&mut group, &mut WriteMemo::new())
        .unwrap();
        assert!(TextField::read(&group, &mut ReadMemo::new()).is_err());
    }
}
