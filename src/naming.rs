//! ファイル名の重複回避

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// リネーム後の拡張子
pub const RENAMED_EXTENSION: &str = "png";

/// 抽出名ごとの出現回数から一意なファイル名を割り当てる
///
/// 1回目は `{name}.png`、n回目は `{name}_{n}.png`。
/// 生成した名前が既に割り当て済みなら (例: `ANA` を2回の後に `ANA_2`)
/// カウンタを進めて空いている名前を探す。
#[derive(Debug, Default)]
pub struct NameCounter {
    counts: HashMap<String, u32>,
    issued: HashSet<String>,
}

impl NameCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 候補名から一意なファイル名を割り当て
    pub fn assign(&mut self, candidate: &str) -> String {
        let count = self.counts.entry(candidate.to_string()).or_insert(0);

        loop {
            *count += 1;
            let filename = if *count == 1 {
                format!("{}.{}", candidate, RENAMED_EXTENSION)
            } else {
                format!("{}_{}.{}", candidate, count, RENAMED_EXTENSION)
            };

            if self.issued.insert(filename.clone()) {
                return filename;
            }
        }
    }
}

/// ディレクトリ内でユニークなパスを取得（同名ファイルがある場合は連番を付与）
pub fn unique_path_in(directory: &Path, filename: &str) -> PathBuf {
    let path = Path::new(filename);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(filename);
    let ext = path.extension().and_then(|s| s.to_str());

    let mut candidate = directory.join(filename);
    let mut counter = 1;

    while candidate.exists() {
        let numbered = match ext {
            Some(ext) => format!("{}_{}.{}", stem, counter, ext),
            None => format!("{}_{}", stem, counter),
        };
        candidate = directory.join(numbered);
        counter += 1;
    }

    candidate
}
