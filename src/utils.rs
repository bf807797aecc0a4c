//! Text normalization for search / 検索用テキスト正規化
//!
//! The same folding runs over query keywords and, at ingest time, over the
//! `*_norm` shadow columns. SQL `LIKE` and any in-memory filter therefore
//! agree on case, character width and kana variants.
//!
//! Folding steps / 正規化の内容:
//! - full-width ASCII -> half-width (ＡＢＣ１２３ -> abc123)
//! - half-width katakana -> full-width, voiced marks combined (ﾋﾞﾙ -> ビル)
//! - ideographic space -> ASCII space, whitespace runs collapsed
//! - lowercase

/// Normalize a text fragment for matching / 検索用に正規化
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{3000}' => out.push(' '),
            // Full-width ASCII block is a fixed offset from ASCII / 全角英数
            '\u{FF01}'..='\u{FF5E}' => {
                out.push(char::from_u32(c as u32 - 0xFEE0).unwrap_or(c));
            }
            '\u{FF61}'..='\u{FF9F}' => push_halfwidth_kana(&mut out, c),
            _ => out.push(c),
        }
    }

    out.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a raw query into normalized keywords / キーワード分割
///
/// Splits on both ASCII and ideographic whitespace, the way users actually
/// type mixed-width queries.
pub fn parse_keywords(query: &str) -> Vec<String> {
    normalize_text(query)
        .split(' ')
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Substring match between a raw field and an already-normalized keyword.
pub fn normalized_contains(field: &str, normalized_keyword: &str) -> bool {
    normalize_text(field).contains(normalized_keyword)
}

fn push_halfwidth_kana(out: &mut String, c: char) {
    match c {
        // Voiced/semi-voiced marks attach to the preceding base kana / 濁点・半濁点
        'ﾞ' => match out.pop() {
            Some(prev) => match voiced(prev) {
                Some(v) => out.push(v),
                None => {
                    out.push(prev);
                    out.push('゛');
                }
            },
            None => out.push('゛'),
        },
        'ﾟ' => match out.pop() {
            Some(prev) => match semi_voiced(prev) {
                Some(v) => out.push(v),
                None => {
                    out.push(prev);
                    out.push('゜');
                }
            },
            None => out.push('゜'),
        },
        _ => out.push(to_fullwidth_kana(c)),
    }
}

/// Half-width katakana to full-width / 半角カナ -> 全角カナ
fn to_fullwidth_kana(c: char) -> char {
    match c {
        '｡' => '。', '｢' => '「', '｣' => '」', '､' => '、', '･' => '・',
        'ｦ' => 'ヲ', 'ｧ' => 'ァ', 'ｨ' => 'ィ', 'ｩ' => 'ゥ', 'ｪ' => 'ェ',
        'ｫ' => 'ォ', 'ｬ' => 'ャ', 'ｭ' => 'ュ', 'ｮ' => 'ョ', 'ｯ' => 'ッ',
        'ｰ' => 'ー',
        'ｱ' => 'ア', 'ｲ' => 'イ', 'ｳ' => 'ウ', 'ｴ' => 'エ', 'ｵ' => 'オ',
        'ｶ' => 'カ', 'ｷ' => 'キ', 'ｸ' => 'ク', 'ｹ' => 'ケ', 'ｺ' => 'コ',
        'ｻ' => 'サ', 'ｼ' => 'シ', 'ｽ' => 'ス', 'ｾ' => 'セ', 'ｿ' => 'ソ',
        'ﾀ' => 'タ', 'ﾁ' => 'チ', 'ﾂ' => 'ツ', 'ﾃ' => 'テ', 'ﾄ' => 'ト',
        'ﾅ' => 'ナ', 'ﾆ' => 'ニ', 'ﾇ' => 'ヌ', 'ﾈ' => 'ネ', 'ﾉ' => 'ノ',
        'ﾊ' => 'ハ', 'ﾋ' => 'ヒ', 'ﾌ' => 'フ', 'ﾍ' => 'ヘ', 'ﾎ' => 'ホ',
        'ﾏ' => 'マ', 'ﾐ' => 'ミ', 'ﾑ' => 'ム', 'ﾒ' => 'メ', 'ﾓ' => 'モ',
        'ﾔ' => 'ヤ', 'ﾕ' => 'ユ', 'ﾖ' => 'ヨ',
        'ﾗ' => 'ラ', 'ﾘ' => 'リ', 'ﾙ' => 'ル', 'ﾚ' => 'レ', 'ﾛ' => 'ロ',
        'ﾜ' => 'ワ', 'ﾝ' => 'ン',
        _ => c,
    }
}

fn voiced(c: char) -> Option<char> {
    let v = match c {
        'カ' => 'ガ', 'キ' => 'ギ', 'ク' => 'グ', 'ケ' => 'ゲ', 'コ' => 'ゴ',
        'サ' => 'ザ', 'シ' => 'ジ', 'ス' => 'ズ', 'セ' => 'ゼ', 'ソ' => 'ゾ',
        'タ' => 'ダ', 'チ' => 'ヂ', 'ツ' => 'ヅ', 'テ' => 'デ', 'ト' => 'ド',
        'ハ' => 'バ', 'ヒ' => 'ビ', 'フ' => 'ブ', 'ヘ' => 'ベ', 'ホ' => 'ボ',
        'ウ' => 'ヴ',
        _ => return None,
    };
    Some(v)
}

fn semi_voiced(c: char) -> Option<char> {
    let v = match c {
        'ハ' => 'パ', 'ヒ' => 'ピ', 'フ' => 'プ', 'ヘ' => 'ペ', 'ホ' => 'ポ',
        _ => return None,
    };
    Some(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fullwidth_ascii_folds() {
        assert_eq!(normalize_text("ＴＯＫＹＯ　Ｔｏｗｅｒ"), "tokyo tower");
        assert_eq!(normalize_text("１９６４"), "1964");
    }

    #[test]
    fn test_halfwidth_kana_folds() {
        assert_eq!(normalize_text("ﾀﾜｰ"), "タワー");
        assert_eq!(normalize_text("ﾋﾞﾙﾃﾞｨﾝｸﾞ"), "ビルディング");
        assert_eq!(normalize_text("ﾊﾟﾚｽ"), "パレス");
    }

    #[test]
    fn test_whitespace_collapses() {
        assert_eq!(normalize_text("  安藤　 忠雄  "), "安藤 忠雄");
    }

    #[test]
    fn test_parse_keywords_mixed_spaces() {
        assert_eq!(parse_keywords("美術館　東京"), vec!["美術館", "東京"]);
        assert_eq!(parse_keywords("  Museum  Tokyo "), vec!["museum", "tokyo"]);
        assert!(parse_keywords("　 　").is_empty());
        assert!(parse_keywords("").is_empty());
    }

    #[test]
    fn test_normalized_contains_width_insensitive() {
        assert!(normalized_contains("東京ﾀﾜｰ", "タワー"));
        assert!(normalized_contains("ＳＡＮＡＡ本社", "sanaa"));
        assert!(!normalized_contains("東京タワー", "美術館"));
    }
}
