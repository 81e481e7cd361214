//! 请求分组
//!
//! 把规范化后的股票代码按数据源单次请求上限切分为若干组，每组以逗号拼接。

/// 按 `max_batch_size` 切分，保持输入顺序；空输入返回空列表
pub fn plan_batches(codes: &[String], max_batch_size: usize) -> Vec<String> {
    codes
        .chunks(max_batch_size.max(1))
        .map(|chunk| chunk.join(","))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn codes(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("0{:06}", 600000 + i)).collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(plan_batches(&[], 800).is_empty());
    }

    #[test]
    fn test_single_batch() {
        let batches = plan_batches(&codes(3), 800);
        assert_eq!(batches, vec!["0600000,0600001,0600002"]);
    }

    #[test]
    fn test_exact_multiple() {
        let batches = plan_batches(&codes(120), 60);
        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|b| b.split(',').count() == 60));
    }

    proptest! {
        #[test]
        fn prop_batches_partition_input(n in 0usize..2000, max in 1usize..900) {
            let input = codes(n);
            let batches = plan_batches(&input, max);

            prop_assert_eq!(batches.len(), (n + max - 1) / max);
            prop_assert!(batches.iter().all(|b| !b.is_empty()));
            prop_assert!(batches.iter().all(|b| b.split(',').count() <= max));

            let rebuilt: Vec<String> = batches
                .iter()
                .flat_map(|b| b.split(',').map(String::from))
                .collect();
            prop_assert_eq!(rebuilt, input);
        }
    }
}
