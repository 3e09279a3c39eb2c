/// Apply `offset` then `limit` to an already sorted list.
///
/// An offset at or past the end yields an empty page. A `limit` of zero or
/// less means "no limit".
pub fn paginate<T>(items: Vec<T>, limit: i64, offset: usize) -> Vec<T> {
    if offset >= items.len() {
        return Vec::new();
    }
    let rest = items.into_iter().skip(offset);
    match usize::try_from(limit) {
        Ok(limit) if limit > 0 => rest.take(limit).collect(),
        _ => rest.collect(),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn offset_then_limit() {
        let items: Vec<u32> = (0..10).collect();
        assert_eq!(paginate(items.clone(), 3, 2), vec![2, 3, 4]);
        assert_eq!(paginate(items.clone(), 0, 8), vec![8, 9]);
        assert_eq!(paginate(items.clone(), -1, 0).len(), 10);
        assert!(paginate(items, 5, 10).is_empty());
    }

    #[test]
    fn empty_input() {
        assert!(paginate(Vec::<u32>::new(), 5, 0).is_empty());
    }

    proptest! {
        #[test]
        fn page_is_a_contiguous_slice(
            len in 0usize..50,
            limit in -3i64..60,
            offset in 0usize..60,
        ) {
            let items: Vec<usize> = (0..len).collect();
            let page = paginate(items, limit, offset);

            let available = len.saturating_sub(offset);
            let expected = if limit > 0 { available.min(limit as usize) } else { available };
            prop_assert_eq!(page.len(), expected);
            for (i, value) in page.iter().enumerate() {
                prop_assert_eq!(*value, offset + i);
            }
        }
    }
}
