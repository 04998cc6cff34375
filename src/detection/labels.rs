// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 类别名称表 (classes 文件, 每行一个名称)
//!
//! 类别ID从 0 开始, 直接作为行号索引。

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::types::Detection;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassNames {
    names: Vec<String>,
}

impl ClassNames {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read class names from {:?}", path))?;
        let names = Self::parse(&text);
        info!("✅ 类别名称已从 {:?} 加载 ({} 类)", path, names.len());
        Ok(names)
    }

    pub fn parse(text: &str) -> Self {
        Self::new(
            text.lines()
                .map(|line| line.trim_end_matches('\r').to_string())
                .collect(),
        )
    }

    pub fn get(&self, class_id: usize) -> Option<&str> {
        self.names.get(class_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// 标签文本: "name:0.90", 没有名称时只显示置信度
    pub fn label(&self, detection: &Detection) -> String {
        let conf = format!("{:.2}", detection.confidence());
        match self.get(detection.class_id()) {
            Some(name) => format!("{}:{}", name, conf),
            None => conf,
        }
    }
}
