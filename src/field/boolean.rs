use crate::{
    array::{ArrayKind, ArrayRef, BoolArray},
    config::FieldConfig,
    field::{existing_array, FieldCore, FieldFactory, FieldValue},
    memo::ReadMemo,
    store::Group,
    Result,
};

/// Flag field
#[derive(Debug, Clone)]
pub struct BoolField {
    core: FieldCore,
}

impl FieldFactory for BoolField {
    const TAG: &'static str = "bool";

    fn construct(
        num_obs: usize,
        name: &str,
        value: FieldValue,
        config: &FieldConfig,
    ) -> Result<Self> {
        let data = match value {
            FieldValue::Bools(values) => ArrayRef::new(BoolArray::new(values)),
            other => existing_array(Self::TAG, ArrayKind::Bool, &other)?,
        };

        Ok(BoolField {
            core: FieldCore::new(num_obs, name, data, config)?,
        })
    }

    fn read(group: &Group, memo: &mut ReadMemo) -> Result<Self> {
        let core = FieldCore::read(group, memo)?;
        core.expect_kind(ArrayKind::Bool)?;
        Ok(BoolField { core })
    }
}

super::impl_field_type!(BoolField, <BoolField as FieldFactory>::TAG);
