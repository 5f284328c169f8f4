use serde::Serialize;

/// 版本库中的一个提交文件
///
/// 路径约定为 `{作业标题}/{提交文件名}`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryFile {
    pub path: String,
    // 版本标记，更新文件时需要
    pub sha: String,
    #[serde(skip)]
    pub content: Option<Vec<u8>>,
}

/// 写入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteKind {
    Created,
    Updated,
}
