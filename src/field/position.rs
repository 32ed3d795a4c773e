use crate::{
    array::{ArrayKind, ArrayRef, PositionArray},
    config::FieldConfig,
    field::{existing_array, required_arg, FieldCore, FieldFactory, FieldValue},
    memo::ReadMemo,
    store::Group,
    Result,
};

/// Position field.
///
/// Raw [`FieldValue::Positions`] need the `system` argument, and pick up the `time`
/// argument as nested time array. Pass the dataset's time field handle there to keep
/// positions and epochs aligned through every mutation.
///
/// An existing [`PositionArray`] passed as [`FieldValue::Array`] already carries its system
/// and nested time. `system` and `time` may then only repeat them: a different system, or
/// a time that is not the array's own nested time, is an initialization error.
#[derive(Debug, Clone)]
pub struct PositionField {
    core: FieldCore,
}

impl PositionField {
    /// The positions of this field
    #[must_use]
    pub fn positions(&self) -> Option<&PositionArray> {
        self.core.data().downcast()
    }
}

impl FieldFactory for PositionField {
    const TAG: &'static str = "position";

    fn construct(
        num_obs: usize,
        name: &str,
        value: FieldValue,
        config: &FieldConfig,
    ) -> Result<Self> {
        let data = match value {
            FieldValue::Positions(values) => {
                let system: String =
                    required_arg("PositionArray", "system", config.system.as_deref())?;
                ArrayRef::new(PositionArray::new(values, &system, config.time.clone())?)
            }
            other => {
                let data = existing_array(Self::TAG, ArrayKind::Position, &other)?;
                check_existing(&data, config)?;
                data
            }
        };

        Ok(PositionField {
            core: FieldCore::new(num_obs, name, data, config)?,
        })
    }

    fn read(group: &Group, memo: &mut ReadMemo) -> Result<Self> {
        let core = FieldCore::read(group, memo)?;
        core.expect_kind(ArrayKind::Position)?;
        Ok(PositionField { core })
    }
}

/// Rejects `system` and `time` arguments that contradict an existing position array.
fn check_existing(data: &ArrayRef, config: &FieldConfig) -> Result<()> {
    let Some(positions) = data.downcast::<PositionArray>() else {
        return Ok(());
    };

    if let Some(system) = config.system.as_deref() {
        if system != positions.system() {
            return Err(initialization_error!(
                "system",
                "Positions are given in '{}', not '{}'",
                positions.system(),
                system
            ));
        }
    }

    if let Some(time) = &config.time {
        if !positions.time().is_some_and(|nested| nested.same_array(time)) {
            return Err(initialization_error!(
                "time",
                "The time argument is not the nested time of the positions"
            ));
        }
    }
    Ok(())
}

super::impl_field_type!(PositionField, <PositionField as FieldFactory>::TAG);
