use sentiment_rnn::{Vectorizer, PAD_ID};

#[test]
fn short_sequences_are_left_padded() {
    let vectorizer = Vectorizer::new(6);

    let out = vectorizer.vectorize(&[7, 8, 9]);

    // Pad ids on the left, original ids in order on the right
    assert_eq!(out, vec![PAD_ID, PAD_ID, PAD_ID, 7, 8, 9]);
}

#[test]
fn long_sequences_keep_only_the_last_maxlen_ids() {
    let vectorizer = Vectorizer::new(4);

    let out = vectorizer.vectorize(&[1, 2, 3, 4, 5, 6, 7]);

    assert_eq!(out, vec![4, 5, 6, 7]);
}

#[test]
fn exact_length_input_passes_through_unchanged() {
    let vectorizer = Vectorizer::new(5);

    let out = vectorizer.vectorize(&[9, 8, 7, 6, 5]);

    assert_eq!(out, vec![9, 8, 7, 6, 5]);
}

#[test]
fn empty_input_becomes_all_pad() {
    let vectorizer = Vectorizer::new(5);

    assert_eq!(vectorizer.vectorize(&[]), vec![PAD_ID; 5]);
}

#[test]
fn output_length_is_always_maxlen() {
    let vectorizer = Vectorizer::new(6);

    for len in 0..20 {
        let ids: Vec<usize> = (0..len).collect();
        assert_eq!(vectorizer.vectorize(&ids).len(), 6);
    }
}

#[test]
fn two_review_scenario_follows_the_padding_rule() {
    // pad=0, the=1, cat=2, sat=3, on=4, mat=5, dog=6, ate=7, my=8, homework=9
    let vectorizer = Vectorizer::new(6);

    // "the cat sat on the mat": six ids, passes through
    let positive = vectorizer.vectorize(&[1, 2, 3, 4, 1, 5]);
    assert_eq!(positive, vec![1, 2, 3, 4, 1, 5]);

    // "the dog ate my homework": five ids, gains one pad on the left
    let negative = vectorizer.vectorize(&[1, 6, 7, 8, 9]);
    assert_eq!(negative, vec![0, 1, 6, 7, 8, 9]);
}

#[test]
fn batch_is_stacked_one_row_per_sequence() {
    let vectorizer = Vectorizer::new(4);

    let batch = vectorizer.vectorize_batch(&[&[1, 2][..], &[3, 4, 5, 6, 7][..]]);

    assert_eq!(batch.shape(), [2, 4]);
    assert_eq!(batch.row(0).to_vec(), vec![PAD_ID, PAD_ID, 1, 2]);
    assert_eq!(batch.row(1).to_vec(), vec![4, 5, 6, 7]);
}
