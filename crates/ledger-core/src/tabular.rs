//! 단순 CSV 텍스트 파싱 유틸리티.
//!
//! 따옴표 안의 콤마는 지원하지 않습니다. 모든 셀은 앞뒤 공백을 제거합니다.

/// 한 줄을 콤마로 나누고 각 셀의 공백을 제거합니다.
pub fn split_line(line: &str) -> Vec<&str> {
    line.split(',').map(|s| s.trim()).collect()
}

/// 헤더 다음의 데이터 줄을 `(줄 번호, 내용)`으로 순회합니다.
///
/// 첫 줄은 헤더로 간주해 건너뜁니다. 빈 줄과 `#`으로 시작하는 주석 줄도 건너뜁니다.
/// 줄 번호는 1부터 시작합니다.
pub fn data_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .skip(1)
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

/// 헤더 줄의 셀 목록을 반환합니다. 입력이 비어 있으면 `None`입니다.
pub fn header(content: &str) -> Option<Vec<&str>> {
    content.lines().next().map(split_line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_line_trims() {
        assert_eq!(split_line(" a , b,c ,, "), vec!["a", "b", "c", "", ""]);
    }

    #[test]
    fn test_data_lines_skip_header_blank_and_comments() {
        let content = "id,symbol\n\nAAPL,AAPL\n# comment\n  MSFT,MSFT  \n";
        let rows: Vec<_> = data_lines(content).collect();
        assert_eq!(rows, vec![(3, "AAPL,AAPL"), (5, "MSFT,MSFT")]);
    }

    #[test]
    fn test_header() {
        assert!(header("").is_none());
        assert_eq!(header("a,b\n1,2").unwrap(), vec!["a", "b"]);
    }
}
