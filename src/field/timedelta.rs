use crate::{
    array::{ArrayKind, ArrayRef, TimeDeltaArray, TimeFormat, TimeScale},
    config::FieldConfig,
    field::{existing_array, required_arg, FieldCore, FieldFactory, FieldValue},
    memo::ReadMemo,
    store::Group,
    Result,
};

/// Time-like field. Never has a unit; the array's format carries that meaning.
///
/// Raw [`FieldValue::Floats`] need the `scale` and `fmt` arguments. An existing
/// [`TimeDeltaArray`] is wrapped without them.
#[derive(Debug, Clone)]
pub struct TimeDeltaField {
    core: FieldCore,
}

impl FieldFactory for TimeDeltaField {
    const TAG: &'static str = "time_delta";

    fn construct(
        num_obs: usize,
        name: &str,
        value: FieldValue,
        config: &FieldConfig,
    ) -> Result<Self> {
        if let Some(unit) = &config.unit {
            return Err(initialization_error!(
                "unit",
                "A {} field has no unit, got '{}'",
                Self::TAG,
                unit
            ));
        }

        let data = match value {
            FieldValue::Floats(values) => {
                let scale: TimeScale =
                    required_arg("TimeDeltaArray", "scale", config.scale.as_deref())?;
                let fmt: TimeFormat = required_arg("TimeDeltaArray", "fmt", config.fmt.as_deref())?;
                ArrayRef::new(TimeDeltaArray::new(&values, scale, fmt))
            }
            other => existing_array(Self::TAG, ArrayKind::TimeDelta, &other)?,
        };

        Ok(TimeDeltaField {
            core: FieldCore::new(num_obs, name, data, config)?,
        })
    }

    fn read(group: &Group, memo: &mut ReadMemo) -> Result<Self> {
        let core = FieldCore::read(group, memo)?;
        core.expect_kind(ArrayKind::TimeDelta)?;
        Ok(TimeDeltaField { core })
    }
}

super::impl_field_type!(TimeDeltaField, <TimeDeltaField as FieldFactory>::TAG);
