// Dispatch of independent block operations.  With the `parallel`
// feature the chunks are handed to the rayon thread pool, otherwise
// they are processed in order on the calling thread.  Each chunk is
// written by exactly one call, so results do not depend on the
// number of threads.

cfg_if::cfg_if! {
    if #[cfg(feature = "parallel")] {
        use rayon::prelude::*;

        pub(crate) fn for_each_chunk_mut<T, F>(data: &mut [T], chunk: usize, f: F)
        where
            T: Send,
            F: Fn(usize, &mut [T]) + Sync + Send,
        {
            data.par_chunks_mut(chunk)
                .enumerate()
                .for_each(|(k, c)| f(k, c));
        }
    } else {
        pub(crate) fn for_each_chunk_mut<T, F>(data: &mut [T], chunk: usize, f: F)
        where
            F: Fn(usize, &mut [T]),
        {
            data.chunks_mut(chunk)
                .enumerate()
                .for_each(|(k, c)| f(k, c));
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_chunks_visited_once() {
        let mut data = vec![0usize; 12];
        for_each_chunk_mut(&mut data, 4, |k, c| c.iter_mut().for_each(|x| *x += k + 1));
        assert_eq!(data, vec![1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3]);
    }
}
