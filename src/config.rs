//! RGBA 移植配置
//!
//! 所有参数扁平化，直接在代码中修改默认值即可。

use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::sync::RwLock;

/// 碰撞策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// 创建双臂/胸部衝突刚体，胸部与四肢碰撞
    #[default]
    Default,
    /// 胸部刚体不参与任何碰撞
    NoCollision,
}

impl CollisionPolicy {
    /// 输出文件名中使用的标签
    pub fn label(self) -> &'static str {
        match self {
            CollisionPolicy::Default => "默认",
            CollisionPolicy::NoCollision => "无碰撞",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "默认" => Some(CollisionPolicy::Default),
            "无碰撞" => Some(CollisionPolicy::NoCollision),
            _ => None,
        }
    }
}

/// 目录中已存在本工具生成的模型时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictStrategy {
    /// 忽略对应的源模型文件
    Skip,
    /// 生成新文件并保留原有文件
    #[default]
    Regenerate,
}

/// 移植配置（扁平化，不嵌套）
#[derive(Debug, Clone)]
pub struct RgbaConfig {
    // ========== 用户参数 ==========
    /// 胸部权重比例，调节胸部运动幅度，默认 0.6
    pub factor: f32,
    /// 胸部刚体半径比例，默认 0.8
    /// 胸部与肢体/胸饰穿模时适当增大，碰撞异常时适当减小
    pub rb_scale_factor: f32,
    /// 碰撞策略
    pub collision: CollisionPolicy,

    // ========== 几何 ==========
    /// 胸部顶点权重阈值（严格大于），默认 0.25
    pub weight_threshold: f32,
    /// 水平胸骨判定角度（度），默认 30
    pub horizontal_angle_deg: f32,

    // ========== 碰撞群组（0~15）==========
    /// 四肢 + 躯干碰撞群组，默认 13
    pub limb_group: u8,
    /// 胸部碰撞群组，默认 14
    pub breast_group: u8,
    /// 重排序起始序号（36 进制 3 位前缀），默认 10000
    pub ordinal_base: u32,

    // ========== 导入导出 ==========
    /// 最大重试次数，默认 5
    pub max_retries: u32,
    /// 重试间隔（毫秒），默认 1000
    pub retry_delay_ms: u64,
    /// 导入缩放，默认 0.08
    pub import_scale: f32,
    /// 导出缩放，默认 12.5
    pub export_scale: f32,
    /// 胸部素材目录（含 RGBA_L.pmx / RGBA_R.pmx）
    pub template_dir: PathBuf,

    // ========== 批处理 ==========
    /// 排除体积较小的文件（KB），默认 1024
    pub size_threshold_kb: u64,
    /// 冲突时的处理方式
    pub conflict_strategy: ConflictStrategy,
}

impl Default for RgbaConfig {
    fn default() -> Self {
        Self {
            factor: 0.6,
            rb_scale_factor: 0.8,
            collision: CollisionPolicy::Default,

            // 等于阈值的顶点不计入
            weight_threshold: 0.25,
            horizontal_angle_deg: 30.0,

            // PE 中为 1~16，这里为 0~15
            limb_group: 13,
            breast_group: 14,
            // 10000 = "7PS"，避开模型已有的序号
            ordinal_base: 10000,

            max_retries: 5,
            retry_delay_ms: 1000,
            import_scale: 0.08,
            export_scale: 12.5,
            template_dir: PathBuf::from("externals"),

            size_threshold_kb: 1024,
            conflict_strategy: ConflictStrategy::Regenerate,
        }
    }
}

impl RgbaConfig {
    /// 四舍五入到两位小数后的权重比例
    pub fn rounded_factor(&self) -> f32 {
        round_to_two_decimals(self.factor.clamp(0.0, 1.0))
    }

    /// 四舍五入到两位小数后的刚体比例
    pub fn rounded_rb_scale_factor(&self) -> f32 {
        round_to_two_decimals(self.rb_scale_factor.clamp(0.0, 10.0))
    }

    pub fn template_path_l(&self) -> PathBuf {
        self.template_dir.join("RGBA_L.pmx")
    }

    pub fn template_path_r(&self) -> PathBuf {
        self.template_dir.join("RGBA_R.pmx")
    }

    /// 实际使用的胸部碰撞群组
    ///
    /// 胸部群组不能与四肢群组重合，选中 13 时改为 12。
    pub fn effective_breast_group(&self) -> u8 {
        let group = self.breast_group.min(15);
        if group == 13 {
            12
        } else {
            group
        }
    }
}

pub fn round_to_two_decimals(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

/// 全局配置实例
static RGBA_CONFIG: Lazy<RwLock<RgbaConfig>> = Lazy::new(|| {
    RwLock::new(RgbaConfig::default())
});

/// 获取当前配置（只读）
pub fn get_config() -> RgbaConfig {
    RGBA_CONFIG.read().unwrap_or_else(|e| e.into_inner()).clone()
}

/// 手动设置配置
pub fn set_config(config: RgbaConfig) {
    *RGBA_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = config;
}

/// 重置为默认配置
pub fn reset_config() {
    *RGBA_CONFIG.write().unwrap_or_else(|e| e.into_inner()) = RgbaConfig::default();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breast_group_never_limb_group() {
        let mut config = RgbaConfig::default();
        assert_eq!(config.effective_breast_group(), 14);

        config.breast_group = 13;
        assert_eq!(config.effective_breast_group(), 12);

        config.breast_group = 40;
        assert_eq!(config.effective_breast_group(), 15);
    }

    #[test]
    fn test_rounding() {
        let config = RgbaConfig { factor: 0.666, rb_scale_factor: 1.234, ..Default::default() };
        assert!((config.rounded_factor() - 0.67).abs() < 1e-6);
        assert!((config.rounded_rb_scale_factor() - 1.23).abs() < 1e-6);
    }

    #[test]
    fn test_global_config() {
        set_config(RgbaConfig { factor: 0.3, ..Default::default() });
        assert_eq!(get_config().factor, 0.3);
        reset_config();
        assert_eq!(get_config().factor, 0.6);
    }

    #[test]
    fn test_collision_label_roundtrip() {
        for policy in [CollisionPolicy::Default, CollisionPolicy::NoCollision] {
            assert_eq!(CollisionPolicy::from_label(policy.label()), Some(policy));
        }
        assert_eq!(CollisionPolicy::from_label("other"), None);
    }
}
