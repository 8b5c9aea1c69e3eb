//! EPS heading-control-assist status decoding and fault latches.

/// Assist status reported by the EPS (`EPS_HCA_Status` and friends).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HcaStatus {
    Disabled,
    Initializing,
    Fault,
    Ready,
    Rejected,
    Active,
    Preempted,
}

impl HcaStatus {
    /// Unknown codes map to `None`; neither fault clause fires for them.
    pub fn from_raw(raw: f64) -> Option<Self> {
        if !raw.is_finite() || raw.fract() != 0.0 {
            return None;
        }
        match raw as i64 {
            0 => Some(Self::Disabled),
            1 => Some(Self::Initializing),
            2 => Some(Self::Fault),
            3 => Some(Self::Ready),
            4 => Some(Self::Rejected),
            5 => Some(Self::Active),
            8 => Some(Self::Preempted),
            _ => None,
        }
    }

    pub const fn code(self) -> u8 {
        match self {
            Self::Disabled => 0,
            Self::Initializing => 1,
            Self::Fault => 2,
            Self::Ready => 3,
            Self::Rejected => 4,
            Self::Active => 5,
            Self::Preempted => 8,
        }
    }
}

/// Derived steering faults for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SteerFaults {
    pub temporary: bool,
    pub permanent: bool,
}

/// Frames after which the EPS is assumed booted even if it never said so.
pub const EPS_INIT_TIMEOUT_FRAMES: u64 = 600;

/// Latches `eps_init_complete`; everything else is recomputed per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HcaFaultState {
    eps_init_complete: bool,
}

impl HcaFaultState {
    pub const fn new() -> Self {
        Self {
            eps_init_complete: false,
        }
    }

    pub const fn eps_init_complete(&self) -> bool {
        self.eps_init_complete
    }

    pub fn update(&mut self, status: Option<HcaStatus>, frame: u64) -> SteerFaults {
        use HcaStatus::*;

        let was = self.eps_init_complete;
        self.eps_init_complete |=
            matches!(status, Some(Disabled | Ready | Active)) || frame > EPS_INIT_TIMEOUT_FRAMES;
        if self.eps_init_complete && !was {
            tracing::debug!(frame, ?status, "eps init complete");
        }

        let init = self.eps_init_complete;
        SteerFaults {
            permanent: status == Some(Disabled)
                || (init && matches!(status, Some(Initializing | Fault))),
            temporary: matches!(status, Some(Rejected | Preempted)) || !init,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_codes() {
        assert_eq!(HcaStatus::from_raw(5.0), Some(HcaStatus::Active));
        assert_eq!(HcaStatus::from_raw(8.0), Some(HcaStatus::Preempted));
        assert_eq!(HcaStatus::from_raw(6.0), None);
        assert_eq!(HcaStatus::from_raw(7.0), None);
        assert_eq!(HcaStatus::from_raw(2.5), None);
        assert_eq!(HcaStatus::from_raw(f64::NAN), None);
        for s in [HcaStatus::Disabled, HcaStatus::Fault, HcaStatus::Rejected] {
            assert_eq!(HcaStatus::from_raw(f64::from(s.code())), Some(s));
        }
    }

    #[test]
    fn init_times_out() {
        let mut st = HcaFaultState::new();
        let f = st.update(Some(HcaStatus::Initializing), 600);
        assert!(f.temporary && !f.permanent);
        let f = st.update(Some(HcaStatus::Initializing), 601);
        assert!(st.eps_init_complete());
        assert!(f.permanent && !f.temporary);
    }

    #[test]
    fn disabled_is_permanent_even_before_init() {
        let mut st = HcaFaultState::new();
        let f = st.update(Some(HcaStatus::Disabled), 0);
        assert!(f.permanent);
        assert!(!f.temporary);
    }

    #[test]
    fn unknown_status_only_reflects_init() {
        let mut st = HcaFaultState::new();
        let f = st.update(None, 1);
        assert_eq!(f, SteerFaults { temporary: true, permanent: false });
        st.update(Some(HcaStatus::Ready), 2);
        let f = st.update(None, 3);
        assert_eq!(f, SteerFaults::default());
    }
}
