//! Sequence builders for the optional behaviours of a pipetting cycle.
//!
//! Each helper appends the creators for one behaviour. Compound creators
//! call them in a fixed order, guarded by [`Sequence::when`], so the order
//! of optional steps reads straight off the calling code.

use tipflow_core::{
    BlowoutParams, LabwareId, LiquidHandlingParams, NozzleConfiguration, PipetteId, Volume,
    WaitForDurationParams, WellLocation, WellName, WellTargetParams,
};
use tipflow_deck::PipetteSpec;
use tipflow_step::atomic::{
    self, AirGapArgs, BlowOutInDisposalArgs, DispenseInDisposalArgs, DropTipArgs,
};
use tipflow_step::Sequence;

use crate::args::{DelayOptions, MixOptions, TouchTipOptions};
use crate::replace_tip::{replace_tip, ReplaceTipArgs};
use crate::target::Target;

/// Flow rate and height for one side of a cycle, defaults resolved.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Side {
    pub flow_rate: f64,
    pub offset_from_bottom: f64,
}

impl Side {
    pub(crate) fn aspirate(spec: &PipetteSpec, flow_rate: Option<f64>, offset: f64) -> Self {
        Self {
            flow_rate: flow_rate.unwrap_or(spec.default_aspirate_flow_rate),
            offset_from_bottom: offset,
        }
    }

    pub(crate) fn dispense(spec: &PipetteSpec, flow_rate: Option<f64>, offset: f64) -> Self {
        Self {
            flow_rate: flow_rate.unwrap_or(spec.default_dispense_flow_rate),
            offset_from_bottom: offset,
        }
    }
}

fn liquid(
    pipette: &PipetteId,
    labware: &LabwareId,
    well: &WellName,
    volume: Volume,
    side: Side,
) -> LiquidHandlingParams {
    LiquidHandlingParams {
        pipette_id: pipette.clone(),
        volume,
        labware_id: labware.clone(),
        well_name: well.clone(),
        well_location: WellLocation::bottom(side.offset_from_bottom),
        flow_rate: side.flow_rate,
    }
}

pub(crate) fn replace(
    seq: &mut Sequence,
    pipette: &PipetteId,
    drop_tip_location: &str,
    nozzles: Option<NozzleConfiguration>,
) {
    seq.compound(
        "replace_tip",
        replace_tip,
        ReplaceTipArgs {
            pipette: pipette.clone(),
            drop_tip_location: drop_tip_location.to_string(),
            nozzles,
        },
    );
}

pub(crate) fn drop_tip(seq: &mut Sequence, pipette: &PipetteId, drop_tip_location: &str) {
    seq.atomic(
        "drop_tip",
        atomic::drop_tip,
        DropTipArgs {
            pipette_id: pipette.clone(),
            drop_tip_location: drop_tip_location.to_string(),
        },
    );
}

pub(crate) fn aspirate(
    seq: &mut Sequence,
    pipette: &PipetteId,
    labware: &LabwareId,
    well: &WellName,
    volume: Volume,
    side: Side,
) {
    seq.atomic("aspirate", atomic::aspirate, liquid(pipette, labware, well, volume, side));
}

/// Dispense into a well, or in place over a trash bin or waste chute.
pub(crate) fn dispense(
    seq: &mut Sequence,
    pipette: &PipetteId,
    target: &Target,
    volume: Volume,
    side: Side,
) {
    match target {
        Target::Well { labware, well } => {
            seq.atomic("dispense", atomic::dispense, liquid(pipette, labware, well, volume, side));
        }
        Target::Disposal(equipment) => {
            seq.atomic(
                "dispense_in_disposal",
                atomic::dispense_in_disposal,
                DispenseInDisposalArgs {
                    pipette_id: pipette.clone(),
                    equipment_id: equipment.clone(),
                    volume,
                    flow_rate: side.flow_rate,
                },
            );
        }
    }
}

/// Aspirate then dispense the step volume at the source.
pub(crate) fn pre_wet(
    seq: &mut Sequence,
    pipette: &PipetteId,
    labware: &LabwareId,
    well: &WellName,
    volume: Volume,
    aspirate_side: Side,
    dispense_side: Side,
) {
    aspirate(seq, pipette, labware, well, volume, aspirate_side);
    dispense(
        seq,
        pipette,
        &Target::well(labware.clone(), well.clone()),
        volume,
        dispense_side,
    );
}

/// `times` aspirate/dispense pairs in one well, with optional waits.
#[allow(clippy::too_many_arguments)]
pub(crate) fn mix(
    seq: &mut Sequence,
    pipette: &PipetteId,
    labware: &LabwareId,
    well: &WellName,
    options: MixOptions,
    aspirate_side: Side,
    dispense_side: Side,
    delays: (Option<f64>, Option<f64>),
) {
    let here = Target::well(labware.clone(), well.clone());
    for _ in 0..options.times {
        aspirate(seq, pipette, labware, well, options.volume, aspirate_side);
        if let Some(seconds) = delays.0 {
            wait(seq, seconds);
        }
        dispense(seq, pipette, &here, options.volume, dispense_side);
        if let Some(seconds) = delays.1 {
            wait(seq, seconds);
        }
    }
}

pub(crate) fn wait(seq: &mut Sequence, seconds: f64) {
    seq.atomic(
        "delay",
        atomic::delay,
        WaitForDurationParams {
            seconds,
            message: None,
        },
    );
}

/// Wait in the well, first moving to the requested height if one is set.
pub(crate) fn delay(seq: &mut Sequence, pipette: &PipetteId, target: &Target, options: DelayOptions) {
    if let (Some(mm), Target::Well { labware, well }) = (options.mm_from_bottom, target) {
        seq.atomic(
            "move_to_well",
            atomic::move_to_well,
            WellTargetParams {
                pipette_id: pipette.clone(),
                labware_id: labware.clone(),
                well_name: well.clone(),
                well_location: WellLocation::bottom(mm),
            },
        );
    }
    wait(seq, options.seconds);
}

pub(crate) fn touch_tip(
    seq: &mut Sequence,
    pipette: &PipetteId,
    labware: &LabwareId,
    well: &WellName,
    options: TouchTipOptions,
) {
    seq.atomic(
        "touch_tip",
        atomic::touch_tip,
        WellTargetParams {
            pipette_id: pipette.clone(),
            labware_id: labware.clone(),
            well_name: well.clone(),
            well_location: WellLocation::top(options.mm_from_top),
        },
    );
}

pub(crate) fn air_gap(
    seq: &mut Sequence,
    pipette: &PipetteId,
    labware: &LabwareId,
    well: &WellName,
    volume: Volume,
    flow_rate: f64,
) {
    seq.atomic(
        "air_gap",
        atomic::air_gap,
        AirGapArgs {
            pipette_id: pipette.clone(),
            volume,
            labware_id: labware.clone(),
            well_name: well.clone(),
            offset_from_top: 0.0,
            flow_rate,
        },
    );
}

/// Blow out at a well top, or in place over a trash bin or waste chute.
pub(crate) fn blowout(seq: &mut Sequence, pipette: &PipetteId, target: &Target, flow_rate: f64) {
    match target {
        Target::Well { labware, well } => {
            seq.atomic(
                "blowout",
                atomic::blowout,
                BlowoutParams {
                    pipette_id: pipette.clone(),
                    labware_id: labware.clone(),
                    well_name: well.clone(),
                    well_location: WellLocation::top(0.0),
                    flow_rate,
                },
            );
        }
        Target::Disposal(equipment) => {
            seq.atomic(
                "blow_out_in_disposal",
                atomic::blow_out_in_disposal,
                BlowOutInDisposalArgs {
                    pipette_id: pipette.clone(),
                    equipment_id: equipment.clone(),
                    flow_rate,
                },
            );
        }
    }
}
