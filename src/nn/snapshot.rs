//! 레이어 파라미터 스냅샷
//!
//! 활성 모드의 표현 버퍼 전체와 설정 스칼라를 담는다.
//! 별도 프레이밍 없이 serde 컨테이너 형식(bincode/JSON) 그대로 저장한다.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::params::ModePayload;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSnapshot {
    pub payload: ModePayload,
    pub w_bit: u32,
    pub gamma_noise_std: f32,
    pub noise_random_state: u64,
    pub crosstalk_factor: f32,
    pub phase_noise_std: f32,
}

impl LayerSnapshot {
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let reader = BufReader::new(File::open(path)?);
        Ok(bincode::deserialize_from(reader)?)
    }

    /// 디버깅/검사용 JSON 내보내기
    pub fn to_json(&self) -> Result<String, Box<dyn std::error::Error>> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
