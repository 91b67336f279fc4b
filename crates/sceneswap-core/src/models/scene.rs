//! 씬 카탈로그.
//!
//! OBS에서 받아온 씬 이름 목록 (화면 표시 순서). 두 역할 선택기의 선택지가 된다.

use serde::{Deserialize, Serialize};

/// 화면 표시 순서의 씬 이름 목록
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneCatalog {
    scenes: Vec<String>,
}

impl SceneCatalog {
    /// 이미 화면 순서로 정렬된 이름으로 카탈로그 생성
    pub fn new(scenes: Vec<String>) -> Self {
        Self { scenes }
    }

    pub fn scenes(&self) -> &[String] {
        &self.scenes
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.scenes.iter().any(|s| s == name)
    }

    /// 새 카탈로그 기준으로 기존 선택을 보정한다.
    ///
    /// 선택이 카탈로그에 남아 있으면 유지하고, 없으면 빈 값으로 떨어뜨린다.
    pub fn reconcile_selection(&self, current: &str) -> String {
        if !current.is_empty() && self.contains(current) {
            current.to_string()
        } else {
            String::new()
        }
    }
}
