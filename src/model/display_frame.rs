//! 显示枠

/// “物理”显示枠名称
pub const PHYSICS_FRAME_NAME: &str = "物理";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisplayFrame {
    pub name: String,
    /// 骨骼名称
    pub items: Vec<String>,
}

impl DisplayFrame {
    pub fn new(name: impl Into<String>, items: Vec<String>) -> Self {
        Self { name: name.into(), items }
    }
}

pub fn find_frame(frames: &[DisplayFrame], name: &str) -> Option<usize> {
    frames.iter().position(|f| f.name == name)
}

/// 合并显示枠：同名枠追加条目，其余枠追加到末尾
pub fn merge_frames(target: &mut Vec<DisplayFrame>, source: Vec<DisplayFrame>) {
    for frame in source {
        match find_frame(target, &frame.name) {
            Some(index) => {
                let existing = &mut target[index];
                for item in frame.items {
                    if !existing.items.contains(&item) {
                        existing.items.push(item);
                    }
                }
            }
            None => target.push(frame),
        }
    }
}

/// 移动显示枠到指定位置（越界时移到末尾）
pub fn move_frame(frames: &mut Vec<DisplayFrame>, from: usize, to: usize) {
    if from >= frames.len() {
        return;
    }
    let frame = frames.remove(from);
    let to = to.min(frames.len());
    frames.insert(to, frame);
}

/// 从所有枠中移除已不存在的骨骼条目
pub fn retain_items<F>(frames: &mut [DisplayFrame], mut keep: F)
where
    F: FnMut(&str) -> bool,
{
    for frame in frames {
        frame.items.retain(|item| keep(item));
    }
}
