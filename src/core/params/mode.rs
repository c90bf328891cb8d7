//! 파라미터화 모드

use serde::{Deserialize, Serialize};

/// 어느 표현이 학습 가능한 진실의 원천인지 나타내는 태그.
/// 레이어 생성 시 한 번 정해지며 런타임에 바뀌지 않는다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Weight,
    Usv,
    Phase,
    Voltage,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Weight => "weight",
            Mode::Usv => "usv",
            Mode::Phase => "phase",
            Mode::Voltage => "voltage",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 위상 → 가중치 재구성에서 다시 만들 하위 경로 선택.
/// 생략된 경로는 직전에 캐시된 U/S/V 값을 재사용한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateList {
    pub phase_u: bool,
    pub phase_s: bool,
    pub phase_v: bool,
}

impl UpdateList {
    pub fn all() -> Self {
        Self { phase_u: true, phase_s: true, phase_v: true }
    }

    pub fn only_s() -> Self {
        Self { phase_u: false, phase_s: true, phase_v: false }
    }
}

impl Default for UpdateList {
    fn default() -> Self {
        Self::all()
    }
}
