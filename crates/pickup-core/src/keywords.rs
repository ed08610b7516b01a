//! Built-in keyword lexicons.
//!
//! Categories are literal keyword lists used by callers to route or filter
//! messages (medical, banking, marketing, ...). The lexicon only answers
//! membership questions; what a hit means is up to the caller.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

pub const EXCLUDED: &str = "excluded";
pub const MEDICAL: &str = "medical";
pub const ECOMMERCE: &str = "ecommerce";
pub const LOGISTICS_STATUS: &str = "logistics_status";
pub const COMPLETED_STATUS: &str = "completed_status";
pub const RETURN_SERVICE: &str = "return_service";
pub const BANKING: &str = "banking";
pub const RING_TONE: &str = "ring_tone";

const EXCLUDED_KEYWORDS: &[&str] = &[
    "系统", "平台", "网站", "APP", "应用", "软件", "程序", "服务", "客服",
    "活动", "优惠", "促销", "折扣", "返现", "返利", "奖励", "积分", "会员",
    "注册", "登录", "密码", "账号", "账户", "充值", "支付", "付款", "退款",
    "订单", "购买", "购物", "商城", "商店", "店铺", "商品", "产品", "货物",
    "通知", "提醒", "公告", "通告", "消息", "信息",
    "生日", "礼包", "包邮", "拒收", "回复", "详情", "查看",
];

const MEDICAL_KEYWORDS: &[&str] = &[
    "医院", "门诊", "科室", "就诊", "挂号", "预约", "签到", "附院", "自助机",
];

const ECOMMERCE_KEYWORDS: &[&str] = &[
    "美团", "饿了么", "淘宝", "天猫", "京东", "拼多多", "抖音", "快手",
    "苏宁", "唯品会", "小红书", "网易严选", "小米有品", "华为商城", "Apple Store",
    "购买", "下单", "订单", "商品", "购物", "优选",
];

const LOGISTICS_STATUS_KEYWORDS: &[&str] = &[
    "物流状态", "已更新", "问题", "解决", "处理详情", "尾号",
];

const COMPLETED_STATUS_KEYWORDS: &[&str] = &[
    "已完成", "已取件", "已签收", "已送达", "已领取", "已出库", "已发货",
    "完成取件", "取件完成",
];

const RETURN_SERVICE_KEYWORDS: &[&str] = &[
    "退货", "退款", "售后", "寄回", "二次销售", "退货快递", "退货单号", "退货申请", "维修",
    "服务单", "闪电退款", "退换",
];

const BANKING_KEYWORDS: &[&str] = &[
    "银行", "信用卡", "储蓄卡", "账户", "余额", "转账", "汇款", "ATM", "网银",
    "手机银行", "还款", "贷款", "利息", "理财", "基金", "股票", "保险", "证券",
    "面签", "实体卡片", "中国邮政", "邮政",
];

const RING_TONE_KEYWORDS: &[&str] = &[
    "视频彩铃", "彩铃", "彩铃包", "视频", "视讯", "来电", "新视界",
];

lazy_static! {
    static ref BUILTIN_LEXICON: KeywordLexicon = KeywordLexicon::new()
        .with_category(KeywordCategory::new(EXCLUDED, KeywordScope::Content, EXCLUDED_KEYWORDS.iter().copied()))
        .with_category(KeywordCategory::new(MEDICAL, KeywordScope::Content, MEDICAL_KEYWORDS.iter().copied()))
        .with_category(KeywordCategory::new(ECOMMERCE, KeywordScope::Content, ECOMMERCE_KEYWORDS.iter().copied()))
        .with_category(KeywordCategory::new(LOGISTICS_STATUS, KeywordScope::Content, LOGISTICS_STATUS_KEYWORDS.iter().copied()))
        .with_category(KeywordCategory::new(COMPLETED_STATUS, KeywordScope::Content, COMPLETED_STATUS_KEYWORDS.iter().copied()))
        .with_category(KeywordCategory::new(RETURN_SERVICE, KeywordScope::Content, RETURN_SERVICE_KEYWORDS.iter().copied()))
        .with_category(KeywordCategory::new(BANKING, KeywordScope::Content, BANKING_KEYWORDS.iter().copied()))
        .with_category(KeywordCategory::new(RING_TONE, KeywordScope::Content, RING_TONE_KEYWORDS.iter().copied()));
}

/// Which part of a message a keyword is tested against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordScope {
    /// Message body.
    #[default]
    Content,
    /// Sender identifier.
    Sender,
}

/// A named list of literal keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCategory {
    name: String,
    scope: KeywordScope,
    keywords: Vec<String>,
}

impl KeywordCategory {
    pub fn new<I, S>(name: impl Into<String>, scope: KeywordScope, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            scope,
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scope(&self) -> KeywordScope {
        self.scope
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Exact membership test.
    pub fn contains(&self, keyword: &str) -> bool {
        self.keywords.iter().any(|k| k == keyword)
    }

    /// Keywords occurring as substrings of `text`, in list order.
    pub fn occurrences<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.keywords
            .iter()
            .map(String::as_str)
            .filter(move |k| !k.is_empty() && text.contains(k))
    }
}

/// A keyword found in a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeywordHit<'a> {
    pub category: &'a str,
    pub keyword: &'a str,
}

/// An ordered set of keyword categories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordLexicon {
    categories: Vec<KeywordCategory>,
}

impl KeywordLexicon {
    /// Create an empty lexicon.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in categories, built once per process.
    pub fn builtin() -> &'static KeywordLexicon {
        &BUILTIN_LEXICON
    }

    /// Add a category, replacing any existing category with the same name.
    pub fn with_category(mut self, category: KeywordCategory) -> Self {
        self.categories.retain(|c| c.name != category.name);
        self.categories.push(category);
        self
    }

    pub fn categories(&self) -> &[KeywordCategory] {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Option<&KeywordCategory> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Every keyword hit. Content categories are tested against `text`,
    /// sender categories against `sender` when one is given.
    pub fn hits<'a>(&'a self, text: &'a str, sender: Option<&'a str>) -> Vec<KeywordHit<'a>> {
        self.categories
            .iter()
            .flat_map(|category| {
                let haystack = match category.scope {
                    KeywordScope::Content => Some(text),
                    KeywordScope::Sender => sender,
                };
                haystack
                    .into_iter()
                    .flat_map(move |h| category.occurrences(h))
                    .map(move |keyword| KeywordHit {
                        category: category.name.as_str(),
                        keyword,
                    })
            })
            .collect()
    }

    /// Names of categories with at least one hit, in lexicon order.
    pub fn matching_categories<'a>(
        &'a self,
        text: &'a str,
        sender: Option<&'a str>,
    ) -> Vec<&'a str> {
        let mut names: Vec<&str> = Vec::new();
        for hit in self.hits(text, sender) {
            if !names.contains(&hit.category) {
                names.push(hit.category);
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtin_categories() {
        let lexicon = KeywordLexicon::builtin();
        assert_eq!(lexicon.categories().len(), 8);
        assert!(lexicon.category(MEDICAL).unwrap().contains("挂号"));
        assert!(lexicon.category(BANKING).unwrap().contains("ATM"));
        assert!(!lexicon.category(BANKING).unwrap().contains("银"));
        assert!(lexicon.category("unknown").is_none());
    }

    #[test]
    fn test_hits_by_scope() {
        let lexicon = KeywordLexicon::new()
            .with_category(KeywordCategory::new("content", KeywordScope::Content, ["取件"]))
            .with_category(KeywordCategory::new("sender", KeywordScope::Sender, ["丰巢"]));

        let hits = lexicon.hits("您的包裹请及时取件", Some("丰巢智能柜"));
        assert_eq!(
            hits,
            vec![
                KeywordHit { category: "content", keyword: "取件" },
                KeywordHit { category: "sender", keyword: "丰巢" },
            ]
        );

        let without_sender = lexicon.hits("丰巢取件", None);
        assert_eq!(without_sender.len(), 1);
    }

    #[test]
    fn test_matching_categories_deduplicates() {
        let names = KeywordLexicon::builtin().matching_categories("您的退货退款申请已完成", None);
        assert_eq!(names, vec![EXCLUDED, COMPLETED_STATUS, RETURN_SERVICE]);
    }

    #[test]
    fn test_with_category_replaces_by_name() {
        let lexicon = KeywordLexicon::new()
            .with_category(KeywordCategory::new("a", KeywordScope::Content, ["x"]))
            .with_category(KeywordCategory::new("a", KeywordScope::Content, ["y"]));
        assert_eq!(lexicon.categories().len(), 1);
        assert!(lexicon.category("a").unwrap().contains("y"));
    }
}
