use super::*;

#[test]
fn test_calculate_strides() {
    assert_eq!(calculate_strides(&[2, 3]), vec![3, 1]);
    assert_eq!(calculate_strides(&[2, 2, 2]), vec![4, 2, 1]);
    assert_eq!(calculate_strides(&[5]), vec![1]);
    assert!(calculate_strides(&[]).is_empty());
}

#[test]
fn test_broadcast_shapes() {
    assert_eq!(broadcast_shapes(&[2, 3], &[3]).unwrap(), vec![2, 3]);
    assert_eq!(broadcast_shapes(&[2, 1], &[1, 4]).unwrap(), vec![2, 4]);
    assert_eq!(broadcast_shapes(&[], &[2, 2]).unwrap(), vec![2, 2]);
    assert!(matches!(
        broadcast_shapes(&[2, 3], &[4]),
        Err(ToychError::BroadcastError { .. })
    ));
}

#[test]
fn test_index_coord_mapping() {
    let shape = [2, 3];
    let strides = calculate_strides(&shape);
    assert_eq!(index_to_coord(4, &strides, &shape), vec![1, 1]);

    // a [3] input read from a [2, 3] result
    let coord = [1, 2];
    assert_eq!(coord_to_index_broadcasted(&coord, &[3], &[1]), 2);
    // a [2, 1] input ignores the column coordinate
    assert_eq!(coord_to_index_broadcasted(&coord, &[2, 1], &[1, 1]), 1);
}
