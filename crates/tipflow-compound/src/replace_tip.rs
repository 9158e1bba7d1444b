//! Swap the mounted tip for a fresh one.

use tipflow_core::{
    CommandCreatorError, CommandCreatorResult, ConfigureNozzleLayoutParams, NozzleConfiguration,
    PipetteId, TipParams,
};
use tipflow_deck::InvariantContext;
use tipflow_state::selectors::next_tip;
use tipflow_state::RobotState;
use tipflow_step::atomic::{self, DropTipArgs};
use tipflow_step::Sequence;
use tracing::trace;

/// Arguments for [`replace_tip`].
#[derive(Clone, Debug, PartialEq)]
pub struct ReplaceTipArgs {
    /// The pipette.
    pub pipette: PipetteId,
    /// Where the old tip goes.
    pub drop_tip_location: String,
    /// Nozzle layout for the new tip; the current layout if `None`.
    pub nozzles: Option<NozzleConfiguration>,
}

/// Drop the current tip (if any), switch nozzle layout if asked, and pick
/// up the next available tip for the engaged nozzles.
///
/// Fails with `INSUFFICIENT_TIPS` when no tiprack assigned to the pipette
/// has a full well, column or rack left.
pub fn replace_tip(
    args: &ReplaceTipArgs,
    ctx: &InvariantContext,
    prev: &RobotState,
) -> CommandCreatorResult {
    let Some(pipette) = ctx.pipette(args.pipette.as_str()) else {
        return Err(CommandCreatorError::PipetteDoesNotExist {
            pipette: args.pipette.clone(),
        }
        .into());
    };
    let location = args.drop_tip_location.as_str();
    if ctx.disposal(location).is_none() && ctx.labware(location).is_none() {
        return Err(CommandCreatorError::DropTipLocationDoesNotExist {
            location: location.to_string(),
        }
        .into());
    }

    let current = prev.nozzles(pipette.id.as_str());
    let layout = args.nozzles.unwrap_or(current);
    let channels = layout.active_channels(pipette.spec.channels);
    let Some(next) = next_tip(ctx, prev, pipette, channels) else {
        return Err(CommandCreatorError::InsufficientTips.into());
    };
    trace!(pipette = %pipette.id, tiprack = %next.tiprack, well = %next.well, "next tip");

    let mut seq = Sequence::new();
    seq.atomic(
        "drop_tip",
        atomic::drop_tip,
        DropTipArgs {
            pipette_id: pipette.id.clone(),
            drop_tip_location: args.drop_tip_location.clone(),
        },
    )
    .when(layout != current, |s| {
        s.atomic(
            "configure_nozzle_layout",
            atomic::configure_nozzle_layout,
            ConfigureNozzleLayoutParams {
                pipette_id: pipette.id.clone(),
                configuration_params: layout,
            },
        );
    })
    .atomic(
        "pick_up_tip",
        atomic::pick_up_tip,
        TipParams {
            pipette_id: pipette.id.clone(),
            labware_id: next.tiprack,
            well_name: next.well,
        },
    );
    seq.reduce(ctx, prev)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tipflow_core::Command;
    use tipflow_test_utils::fixtures::*;
    use tipflow_test_utils::{command_types, empty_tiprack, with_tip};

    fn args(pipette: &str) -> ReplaceTipArgs {
        ReplaceTipArgs {
            pipette: pipette.into(),
            drop_tip_location: TRASH.into(),
            nozzles: None,
        }
    }

    #[test]
    fn picks_first_tip_without_dropping() {
        let ctx = ot2_context();
        let state = ot2_initial_state(&ctx);
        let out = replace_tip(&args(P300_SINGLE), &ctx, &state).unwrap();
        match &out.commands[..] {
            [Command::PickUpTip(p)] => {
                assert_eq!(p.labware_id.as_str(), TIPRACK_1);
                assert_eq!(p.well_name.as_str(), "A1");
            }
            other => panic!("expected a single pickUpTip, got {other:?}"),
        }
    }

    #[test]
    fn drops_mounted_tip_first() {
        let ctx = ot2_context();
        let mut state = ot2_initial_state(&ctx);
        with_tip(&mut state, P300_SINGLE);
        let out = replace_tip(&args(P300_SINGLE), &ctx, &state).unwrap();
        assert_eq!(command_types(&out.commands), vec!["dropTip", "pickUpTip"]);
    }

    #[test]
    fn falls_through_to_next_rack() {
        let ctx = ot2_context();
        let mut state = ot2_initial_state(&ctx);
        empty_tiprack(&mut state, TIPRACK_1);
        let out = replace_tip(&args(P300_SINGLE), &ctx, &state).unwrap();
        match &out.commands[..] {
            [Command::PickUpTip(p)] => assert_eq!(p.labware_id.as_str(), TIPRACK_2),
            other => panic!("expected pickUpTip, got {other:?}"),
        }
    }

    #[test]
    fn out_of_tips() {
        let ctx = ot2_context();
        let mut state = ot2_initial_state(&ctx);
        empty_tiprack(&mut state, TIPRACK_1);
        empty_tiprack(&mut state, TIPRACK_2);
        let errors = replace_tip(&args(P300_SINGLE), &ctx, &state).unwrap_err();
        assert_eq!(errors.kinds(), vec!["INSUFFICIENT_TIPS"]);
    }

    #[test]
    fn multi_channel_skips_partial_columns() {
        let ctx = ot2_context();
        let mut state = ot2_initial_state(&ctx);
        state
            .tip_state
            .tipracks
            .get_mut(TIPRACK_1)
            .unwrap()
            .insert("C1".into(), false);
        let out = replace_tip(&args(P300_MULTI), &ctx, &state).unwrap();
        match &out.commands[..] {
            [Command::PickUpTip(p)] => assert_eq!(p.well_name.as_str(), "A2"),
            other => panic!("expected pickUpTip, got {other:?}"),
        }
    }

    #[test]
    fn unknown_drop_location() {
        let ctx = ot2_context();
        let state = ot2_initial_state(&ctx);
        let mut a = args(P300_SINGLE);
        a.drop_tip_location = "nowhere".into();
        let errors = replace_tip(&a, &ctx, &state).unwrap_err();
        assert_eq!(errors.kinds(), vec!["DROP_TIP_LOCATION_DOES_NOT_EXIST"]);
    }

    #[test]
    fn nozzle_change_reconfigures_before_pickup() {
        let ctx = flex_context();
        let state = flex_initial_state(&ctx);
        let a = ReplaceTipArgs {
            pipette: P1000_96.into(),
            drop_tip_location: TRASH_BIN.into(),
            nozzles: Some(NozzleConfiguration::Column),
        };
        let out = replace_tip(&a, &ctx, &state).unwrap();
        assert_eq!(
            command_types(&out.commands),
            vec!["configureNozzleLayout", "pickUpTip"]
        );
    }
}
