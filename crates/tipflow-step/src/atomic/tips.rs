//! Tip pick-up, drop and nozzle layout.

use tipflow_core::{
    AddressableAreaParams, Command, CommandCreatorError, CommandCreatorResult,
    CommandsAndWarnings, ConfigureNozzleLayoutParams, NozzleConfiguration, PipetteId,
    PipetteParams, TipParams, WellOffset,
};
use tipflow_deck::{EquipmentKind, InvariantContext};
use tipflow_state::selectors::active_channels;
use tipflow_state::RobotState;
use tracing::trace;

use super::{finish, require_labware, require_pipette};
use crate::hazards::pipette_access_errors;
use crate::python;

/// Pick up tip(s) with the primary nozzle over `well_name` of a tiprack.
pub fn pick_up_tip(args: &TipParams, ctx: &InvariantContext, prev: &RobotState) -> CommandCreatorResult {
    const ACTION: &str = "pick up tip";
    let mut errors = Vec::new();
    let pipette = require_pipette(ctx, &args.pipette_id, &mut errors);
    let def = require_labware(ctx, ACTION, &args.labware_id, &mut errors);

    if let Some(def) = def {
        if !def.is_tiprack {
            errors.push(CommandCreatorError::InvalidStepArgs {
                reason: format!("'{}' is not a tiprack", args.labware_id),
            });
        } else if !def.has_well(args.well_name.as_str()) {
            errors.push(CommandCreatorError::WellDoesNotExist {
                labware: args.labware_id.clone(),
                well: args.well_name.clone(),
            });
        }
    }
    if let (Some(pipette), Some(_)) = (pipette, def) {
        errors.extend(pipette_access_errors(ctx, prev, pipette, &args.labware_id));
    }
    finish(errors)?;

    let fragment = python::pipette(ctx, args.pipette_id.as_str())
        .zip(python::well(ctx, args.labware_id.as_str(), args.well_name.as_str()))
        .map(|(p, w)| format!("{p}.pick_up_tip(location={w})"));
    Ok(CommandsAndWarnings {
        commands: vec![Command::PickUpTip(args.clone())],
        warnings: Vec::new(),
        python: fragment,
    })
}

/// Arguments for [`drop_tip`].
#[derive(Clone, Debug, PartialEq)]
pub struct DropTipArgs {
    /// Pipette dropping its tip.
    pub pipette_id: PipetteId,
    /// A trash bin, waste chute or labware id.
    pub drop_tip_location: String,
}

/// Drop the mounted tip(s).
///
/// Dropping when no tip is mounted is a successful no-op. Destinations:
///
/// - trash bin: `moveToAddressableAreaForDropTip` + `dropTipInPlace`
/// - waste chute: `moveToAddressableArea` + `dropTipInPlace`
/// - labware: `dropTip` into its first well
pub fn drop_tip(args: &DropTipArgs, ctx: &InvariantContext, prev: &RobotState) -> CommandCreatorResult {
    let mut errors = Vec::new();
    let Some(pipette) = require_pipette(ctx, &args.pipette_id, &mut errors) else {
        return Err(errors.into());
    };
    if !prev.pipette_has_tip(pipette.id.as_str()) {
        trace!(pipette = %pipette.id, "no tip to drop");
        return Ok(CommandsAndWarnings::empty());
    }

    let location = args.drop_tip_location.as_str();
    let pipette_name = python::pipette(ctx, args.pipette_id.as_str());

    if let Some(equipment) = ctx.disposal(location) {
        let channels = active_channels(prev, pipette);
        let Some(area) = equipment.addressable_area_name(ctx.robot_type(), channels) else {
            return Err(CommandCreatorError::DropTipLocationDoesNotExist {
                location: location.to_string(),
            }
            .into());
        };
        let params = AddressableAreaParams {
            pipette_id: args.pipette_id.clone(),
            addressable_area_name: area,
            offset: WellOffset::default(),
        };
        let movement = match equipment.kind {
            EquipmentKind::WasteChute => Command::MoveToAddressableArea(params),
            _ => Command::MoveToAddressableAreaForDropTip(params),
        };
        let fragment = pipette_name
            .zip(python::equipment(ctx, location))
            .map(|(p, e)| format!("{p}.drop_tip({e})"));
        return Ok(CommandsAndWarnings {
            commands: vec![
                movement,
                Command::DropTipInPlace(PipetteParams {
                    pipette_id: args.pipette_id.clone(),
                }),
            ],
            warnings: Vec::new(),
            python: fragment,
        });
    }

    if let Some(entity) = ctx.labware(location) {
        let Some(well) = entity.def.first_well() else {
            return Err(CommandCreatorError::DropTipLocationDoesNotExist {
                location: location.to_string(),
            }
            .into());
        };
        let access = pipette_access_errors(ctx, prev, pipette, &entity.id);
        if !access.is_empty() {
            return Err(access.into());
        }
        let fragment = pipette_name
            .zip(python::well(ctx, location, well.as_str()))
            .map(|(p, w)| format!("{p}.drop_tip({w})"));
        return Ok(CommandsAndWarnings {
            commands: vec![Command::DropTip(TipParams {
                pipette_id: args.pipette_id.clone(),
                labware_id: entity.id.clone(),
                well_name: well.clone(),
            })],
            warnings: Vec::new(),
            python: fragment,
        });
    }

    Err(CommandCreatorError::DropTipLocationDoesNotExist {
        location: location.to_string(),
    }
    .into())
}

/// Change which nozzles of a pipette are engaged.
///
/// `Column` needs a 96-channel pipette; `Single` any multi-channel one.
pub fn configure_nozzle_layout(
    args: &ConfigureNozzleLayoutParams,
    ctx: &InvariantContext,
    _prev: &RobotState,
) -> CommandCreatorResult {
    let mut errors = Vec::new();
    let Some(pipette) = require_pipette(ctx, &args.pipette_id, &mut errors) else {
        return Err(errors.into());
    };
    let channels = pipette.spec.channels;
    let supported = match args.configuration_params {
        NozzleConfiguration::All => true,
        NozzleConfiguration::Column => channels == 96,
        NozzleConfiguration::Single => channels > 1,
    };
    if !supported {
        return Err(CommandCreatorError::InvalidStepArgs {
            reason: format!(
                "{:?} nozzle layout is not supported by {}-channel pipette '{}'",
                args.configuration_params, channels, pipette.id
            ),
        }
        .into());
    }

    let style = match args.configuration_params {
        NozzleConfiguration::All => "ALL",
        NozzleConfiguration::Column => "COLUMN",
        NozzleConfiguration::Single => "SINGLE",
    };
    let fragment = python::pipette(ctx, args.pipette_id.as_str())
        .map(|p| format!("{p}.configure_nozzle_layout(style={style})"));
    Ok(CommandsAndWarnings {
        commands: vec![Command::ConfigureNozzleLayout(args.clone())],
        warnings: Vec::new(),
        python: fragment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tipflow_test_utils::fixtures::*;
    use tipflow_test_utils::{command_types, with_tip};

    #[test]
    fn drop_without_tip_is_a_no_op() {
        let ctx = ot2_context();
        let state = ot2_initial_state(&ctx);
        let args = DropTipArgs {
            pipette_id: P300_SINGLE.into(),
            drop_tip_location: TRASH.into(),
        };
        let out = drop_tip(&args, &ctx, &state).unwrap();
        assert!(out.commands.is_empty());
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn drop_into_trash_labware_uses_first_well() {
        let ctx = ot2_context();
        let mut state = ot2_initial_state(&ctx);
        with_tip(&mut state, P300_SINGLE);
        let args = DropTipArgs {
            pipette_id: P300_SINGLE.into(),
            drop_tip_location: TRASH.into(),
        };
        let out = drop_tip(&args, &ctx, &state).unwrap();
        assert_eq!(
            out.commands,
            vec![Command::DropTip(TipParams {
                pipette_id: P300_SINGLE.into(),
                labware_id: TRASH.into(),
                well_name: "A1".into(),
            })]
        );
        assert_eq!(out.python.as_deref(), Some("p300_single.drop_tip(trash[\"A1\"])"));
    }

    #[test]
    fn drop_into_trash_bin_and_waste_chute() {
        let ctx = flex_context();
        let mut state = flex_initial_state(&ctx);
        with_tip(&mut state, P1000_SINGLE);

        let bin = DropTipArgs {
            pipette_id: P1000_SINGLE.into(),
            drop_tip_location: TRASH_BIN.into(),
        };
        let out = drop_tip(&bin, &ctx, &state).unwrap();
        assert_eq!(
            command_types(&out.commands),
            vec!["moveToAddressableAreaForDropTip", "dropTipInPlace"]
        );

        let chute = DropTipArgs {
            pipette_id: P1000_SINGLE.into(),
            drop_tip_location: WASTE_CHUTE.into(),
        };
        let out = drop_tip(&chute, &ctx, &state).unwrap();
        assert_eq!(
            command_types(&out.commands),
            vec!["moveToAddressableArea", "dropTipInPlace"]
        );
    }

    #[test]
    fn unknown_drop_location_is_an_error() {
        let ctx = ot2_context();
        let mut state = ot2_initial_state(&ctx);
        with_tip(&mut state, P300_SINGLE);
        let args = DropTipArgs {
            pipette_id: P300_SINGLE.into(),
            drop_tip_location: "compost".into(),
        };
        let errors = drop_tip(&args, &ctx, &state).unwrap_err();
        assert_eq!(errors.kinds(), vec!["DROP_TIP_LOCATION_DOES_NOT_EXIST"]);
    }

    #[test]
    fn pick_up_from_non_tiprack_is_rejected() {
        let ctx = ot2_context();
        let state = ot2_initial_state(&ctx);
        let args = TipParams {
            pipette_id: P300_SINGLE.into(),
            labware_id: SOURCE_PLATE.into(),
            well_name: "A1".into(),
        };
        let errors = pick_up_tip(&args, &ctx, &state).unwrap_err();
        assert_eq!(errors.kinds(), vec!["INVALID_STEP_ARGS"]);
    }

    #[test]
    fn pick_up_tip_emits_command_and_fragment() {
        let ctx = ot2_context();
        let state = ot2_initial_state(&ctx);
        let args = TipParams {
            pipette_id: P300_SINGLE.into(),
            labware_id: TIPRACK_1.into(),
            well_name: "A1".into(),
        };
        let out = pick_up_tip(&args, &ctx, &state).unwrap();
        assert_eq!(out.commands, vec![Command::PickUpTip(args)]);
        assert_eq!(
            out.python.as_deref(),
            Some("p300_single.pick_up_tip(location=tiprack_1[\"A1\"])")
        );
    }

    #[test]
    fn column_layout_needs_96_channels() {
        let ctx = flex_context();
        let state = flex_initial_state(&ctx);
        let ok = ConfigureNozzleLayoutParams {
            pipette_id: P1000_96.into(),
            configuration_params: NozzleConfiguration::Column,
        };
        assert!(configure_nozzle_layout(&ok, &ctx, &state).is_ok());
        let bad = ConfigureNozzleLayoutParams {
            pipette_id: P1000_SINGLE.into(),
            configuration_params: NozzleConfiguration::Column,
        };
        let errors = configure_nozzle_layout(&bad, &ctx, &state).unwrap_err();
        assert_eq!(errors.kinds(), vec!["INVALID_STEP_ARGS"]);
    }
}
