//! Frame log replay: CSV signal rows in, one JSON line per tick out.
//!
//! Rows are `frame,source,message,signal,value`. `source` is a bus (`pt`,
//! `cam`, or their indices `0`/`2`) for decoded CAN values, or one of
//! `control`, `plan`, `radar`, `param`, `valid` for the planner side of the
//! tick. Values persist until overwritten, like a CAN parser's latest-value
//! cache. All rows sharing a frame number form one tick; frames must not go
//! backwards.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use vwcar_core::ReplayError;
use vwcar_core::controller::{
    ActuatorEcho, CarControl, LongControlState, OutgoingCommand, VisualAlert,
};
use vwcar_core::mocks::{MemoryParams, SignalSnapshot};
use vwcar_core::session::{Session, TickOutput};
use vwcar_traits::{
    Bus, LeadData, LongitudinalPlanSp, ParamKey, ParamStore, PlanSource, RadarState,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayOptions {
    pub max_ticks: Option<u64>,
    pub is_metric: bool,
    pub slc: bool,
    pub skip_empty: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    pub ticks: u64,
    pub messages: u64,
    pub interrupted: bool,
}

#[derive(Debug, Deserialize)]
struct Row {
    frame: u64,
    source: String,
    #[serde(default)]
    message: String,
    signal: String,
    value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Bus(Bus),
    Control,
    Plan,
    Radar,
    Param,
    Valid,
}

fn parse_source(s: &str) -> Option<Source> {
    Some(match s.trim().to_ascii_lowercase().as_str() {
        "pt" | "0" => Source::Bus(Bus::Pt),
        "cam" | "2" => Source::Bus(Bus::Cam),
        "control" => Source::Control,
        "plan" => Source::Plan,
        "radar" => Source::Radar,
        "param" => Source::Param,
        "valid" => Source::Valid,
        _ => return None,
    })
}

fn parse_bus(s: &str) -> Option<Bus> {
    match s.trim().to_ascii_lowercase().as_str() {
        "pt" | "0" => Some(Bus::Pt),
        "cam" | "2" => Some(Bus::Cam),
        _ => None,
    }
}

// ── Planner side ─────────────────────────────────────────────────────────────

/// Latest-wins planner feed: a poll returns what arrived since the last poll.
#[derive(Debug, Default)]
struct ReplayPlan {
    current_plan: LongitudinalPlanSp,
    current_radar: RadarState,
    fresh_plan: bool,
    fresh_radar: bool,
}

impl PlanSource for ReplayPlan {
    fn poll_plan(&mut self) -> Option<LongitudinalPlanSp> {
        std::mem::take(&mut self.fresh_plan).then_some(self.current_plan)
    }

    fn poll_radar(&mut self) -> Option<RadarState> {
        std::mem::take(&mut self.fresh_radar).then_some(self.current_radar)
    }
}

fn on(v: f64) -> bool {
    v != 0.0
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn small_uint(v: f64) -> u8 {
    v.clamp(0.0, f64::from(u8::MAX)) as u8
}

fn apply_control(cc: &mut CarControl, signal: &str, v: f64) -> Result<(), String> {
    match signal {
        "enabled" => cc.enabled = on(v),
        "lat_active" => cc.lat_active = on(v),
        "long_active" => cc.long_active = on(v),
        "steer" => cc.actuators.steer = v,
        "curvature" => cc.actuators.curvature = v,
        "accel" => cc.actuators.accel = v,
        "long_control_state" => {
            cc.actuators.long_control_state = match small_uint(v) {
                0 => LongControlState::Off,
                1 => LongControlState::Pid,
                2 => LongControlState::Stopping,
                3 => LongControlState::Starting,
                other => return Err(format!("long_control_state {other} out of range")),
            };
        }
        "cancel" => cc.cruise_control.cancel = on(v),
        "resume" => cc.cruise_control.resume = on(v),
        "override" => cc.cruise_control.override_ = on(v),
        "v_cruise_kph" => cc.v_cruise_kph = v,
        "set_speed" => cc.hud.set_speed = v,
        "lead_visible" => cc.hud.lead_visible = on(v),
        "lead_distance_bars" => cc.hud.lead_distance_bars = small_uint(v),
        "visual_alert" => {
            cc.hud.visual_alert = match small_uint(v) {
                0 => VisualAlert::None,
                1 => VisualAlert::Fcw,
                2 => VisualAlert::SteerRequired,
                3 => VisualAlert::BrakePressed,
                4 => VisualAlert::WrongGear,
                5 => VisualAlert::SeatbeltUnbuckled,
                6 => VisualAlert::SpeedTooHigh,
                7 => VisualAlert::Ldw,
                other => return Err(format!("visual_alert {other} out of range")),
            };
        }
        "left_lane_visible" => cc.hud.lanes.left_lane_visible = on(v),
        "right_lane_visible" => cc.hud.lanes.right_lane_visible = on(v),
        "left_lane_depart" => cc.hud.lanes.left_lane_depart = on(v),
        "right_lane_depart" => cc.hud.lanes.right_lane_depart = on(v),
        other => return Err(format!("unknown control field {other:?}")),
    }
    Ok(())
}

fn apply_plan(plan: &mut LongitudinalPlanSp, signal: &str, v: f64) -> Result<(), String> {
    match signal {
        "vision_turn_controller_state" => plan.vision_turn_controller_state = small_uint(v),
        "vision_turn_speed" => plan.vision_turn_speed = v,
        "turn_speed_control_state" => plan.turn_speed_control_state = small_uint(v),
        "turn_speed" => plan.turn_speed = v,
        "speed_limit_control_state" => plan.speed_limit_control_state = small_uint(v),
        "speed_limit" => plan.speed_limit = v,
        "speed_limit_offset" => plan.speed_limit_offset = v,
        other => return Err(format!("unknown plan field {other:?}")),
    }
    Ok(())
}

fn apply_radar(radar: &mut RadarState, message: &str, signal: &str, v: f64) -> Result<(), String> {
    let lead: &mut LeadData = match message {
        "lead_one" => &mut radar.lead_one,
        "lead_two" => &mut radar.lead_two,
        other => return Err(format!("unknown radar lead {other:?}")),
    };
    match signal {
        "status" => lead.status = on(v),
        "d_rel" => lead.d_rel = v,
        "v_rel" => lead.v_rel = v,
        other => return Err(format!("unknown lead field {other:?}")),
    }
    Ok(())
}

fn parse_param(signal: &str) -> Option<ParamKey> {
    match signal {
        "speed_limit_control" => Some(ParamKey::SpeedLimitControl),
        "is_metric" => Some(ParamKey::IsMetric),
        "last_speed_limit_sign_tap" => Some(ParamKey::LastSpeedLimitSignTap),
        _ => None,
    }
}

// ── Output records ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct MessageRecord<'a> {
    name: &'static str,
    bus: u8,
    signals: &'a BTreeMap<&'static str, f64>,
}

#[derive(Debug, Serialize)]
struct EchoRecord {
    steer: f64,
    steer_output_can: i32,
    curvature: f64,
    accel: f64,
}

impl From<&ActuatorEcho> for EchoRecord {
    fn from(e: &ActuatorEcho) -> Self {
        Self {
            steer: e.steer,
            steer_output_can: e.steer_output_can,
            curvature: e.curvature,
            accel: e.accel,
        }
    }
}

#[derive(Debug, Serialize)]
struct RadarRecord {
    points: usize,
    errors: Vec<String>,
}

#[derive(Debug, Serialize)]
struct TickRecord<'a> {
    frame: u64,
    tick: u64,
    can_valid: bool,
    v_ego: f64,
    cruise_enabled: bool,
    steer_fault_temporary: bool,
    steer_fault_permanent: bool,
    soft_disable_alert: bool,
    echo: EchoRecord,
    messages: Vec<MessageRecord<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    radar: Option<RadarRecord>,
}

fn messages(cmd: &OutgoingCommand) -> Vec<MessageRecord<'_>> {
    cmd.messages
        .iter()
        .map(|m| MessageRecord {
            name: m.name,
            bus: m.bus.index(),
            signals: &m.values,
        })
        .collect()
}

fn record(frame: u64, tick: u64, out: &TickOutput) -> TickRecord<'_> {
    TickRecord {
        frame,
        tick,
        can_valid: out.state.can_valid,
        v_ego: out.state.v_ego,
        cruise_enabled: out.state.cruise_state.enabled,
        steer_fault_temporary: out.state.steer_fault_temporary,
        steer_fault_permanent: out.state.steer_fault_permanent,
        soft_disable_alert: out.command.soft_disable_alert,
        echo: EchoRecord::from(&out.command.echo),
        messages: messages(&out.command),
        radar: out.radar.as_ref().map(|r| RadarRecord {
            points: r.points.len(),
            errors: r.errors.iter().map(ToString::to_string).collect(),
        }),
    }
}

// ── Driver ───────────────────────────────────────────────────────────────────

struct Replay<'s> {
    session: &'s mut Session,
    snapshot: SignalSnapshot,
    control: CarControl,
    plan: ReplayPlan,
    params: MemoryParams,
    stats: ReplayStats,
}

impl Replay<'_> {
    fn apply(&mut self, line: usize, row: &Row) -> Result<(), ReplayError> {
        let malformed = |reason: String| ReplayError::MalformedRow { line, reason };
        let source = parse_source(&row.source).ok_or_else(|| ReplayError::UnknownBus {
            line,
            bus: row.source.clone(),
        })?;
        match source {
            Source::Bus(bus) => self.snapshot.set(bus, &row.message, &row.signal, row.value),
            Source::Control => apply_control(&mut self.control, &row.signal, row.value)
                .map_err(malformed)?,
            Source::Plan => {
                apply_plan(&mut self.plan.current_plan, &row.signal, row.value)
                    .map_err(malformed)?;
                self.plan.fresh_plan = true;
            }
            Source::Radar => {
                apply_radar(&mut self.plan.current_radar, &row.message, &row.signal, row.value)
                    .map_err(malformed)?;
                self.plan.fresh_radar = true;
            }
            Source::Param => {
                let key = parse_param(&row.signal)
                    .ok_or_else(|| malformed(format!("unknown param {:?}", row.signal)))?;
                self.params.put_bool(key, on(row.value));
            }
            Source::Valid => {
                let bus = parse_bus(&row.signal).ok_or_else(|| ReplayError::UnknownBus {
                    line,
                    bus: row.signal.clone(),
                })?;
                self.snapshot.set_can_valid(bus, on(row.value));
            }
        }
        Ok(())
    }

    fn tick<W: Write>(&mut self, frame: u64, out: &mut W, skip_empty: bool) -> eyre::Result<()> {
        let output = self.session.tick(
            &self.snapshot,
            &self.control,
            &mut self.plan,
            &mut self.params,
        );
        self.stats.ticks += 1;
        self.stats.messages += output.command.messages.len() as u64;
        tracing::trace!(
            frame,
            messages = output.command.messages.len(),
            can_valid = output.state.can_valid,
            "tick"
        );
        if skip_empty && output.command.messages.is_empty() {
            return Ok(());
        }
        let rec = record(frame, self.stats.ticks, &output);
        serde_json::to_writer(&mut *out, &rec).wrap_err("write tick record")?;
        writeln!(out).wrap_err("write tick record")?;
        Ok(())
    }
}

fn line_of(record: &csv::StringRecord) -> usize {
    record
        .position()
        .and_then(|p| usize::try_from(p.line()).ok())
        .unwrap_or(0)
}

/// Replay `input` through `session`, writing one JSON line per tick to `out`.
///
/// `shutdown` is checked between ticks; a set flag ends the replay early with
/// `interrupted = true`.
pub fn run_replay<R: Read, W: Write>(
    session: &mut Session,
    input: R,
    out: &mut W,
    opts: &ReplayOptions,
    shutdown: &AtomicBool,
) -> eyre::Result<ReplayStats> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(input);
    let headers = rdr.headers().wrap_err("read frame log header")?.clone();

    let params = MemoryParams::default()
        .with(ParamKey::IsMetric, opts.is_metric)
        .with(ParamKey::SpeedLimitControl, opts.slc);
    let mut replay = Replay {
        session,
        snapshot: SignalSnapshot::default(),
        control: CarControl::default(),
        plan: ReplayPlan::default(),
        params,
        stats: ReplayStats::default(),
    };

    let limit_reached = |stats: &ReplayStats| opts.max_ticks.is_some_and(|m| stats.ticks >= m);
    let mut pending: Option<u64> = None;

    for result in rdr.records() {
        let record = result.map_err(|e| {
            let line = e
                .position()
                .and_then(|p| usize::try_from(p.line()).ok())
                .unwrap_or(0);
            ReplayError::MalformedRow {
                line,
                reason: e.to_string(),
            }
        })?;
        let line = line_of(&record);
        let row: Row = record
            .deserialize(Some(&headers))
            .map_err(|e| ReplayError::MalformedRow {
                line,
                reason: e.to_string(),
            })?;

        if let Some(last) = pending
            && row.frame != last
        {
            if row.frame < last {
                return Err(ReplayError::FrameOrder {
                    line,
                    frame: row.frame,
                    last,
                }
                .into());
            }
            if shutdown.load(Ordering::Relaxed) {
                tracing::warn!(frame = last, "interrupted; stopping replay");
                replay.stats.interrupted = true;
                out.flush().wrap_err("flush command log")?;
                return Ok(replay.stats);
            }
            replay.tick(last, out, opts.skip_empty)?;
            if limit_reached(&replay.stats) {
                out.flush().wrap_err("flush command log")?;
                return Ok(replay.stats);
            }
        }
        pending = Some(row.frame);
        replay.apply(line, &row)?;
    }

    if let Some(last) = pending {
        if shutdown.load(Ordering::Relaxed) {
            tracing::warn!(frame = last, "interrupted; stopping replay");
            replay.stats.interrupted = true;
        } else {
            replay.tick(last, out, opts.skip_empty)?;
        }
    }
    out.flush().wrap_err("flush command log")?;
    Ok(replay.stats)
}
