//! Demonstrates the basic lifecycle of a `DynamicArray`: growth, insertion, erasure and copying.

use dynamic_array::DynamicArray;

fn main() {
    println!("=== Dynamic Array Basic Example ===");

    let mut array = DynamicArray::new();
    println!("Empty: len {} capacity {}", array.len(), array.capacity());

    for value in 1..=5 {
        array.push_back(value);
        println!(
            "Pushed {value}: len {} capacity {}",
            array.len(),
            array.capacity()
        );
    }

    array.insert(0, 0);
    println!("After inserting 0 at the front: {array:?}");

    array.erase(3);
    println!("After erasing index 3: {array:?}");

    let mut copy = DynamicArray::with_capacity(16);
    copy.clone_from(&array);
    println!(
        "Copy reused its own buffer: {copy:?} (capacity {})",
        copy.capacity()
    );

    // Fallible construction leaves the array untouched on failure.
    let result = array.try_emplace_back(|| "not a number".parse::<i32>());
    println!("Fallible insertion failed: {}", result.is_err());
    println!("Array unchanged: {array:?}");

    while let Some(value) = array.pop_back() {
        println!("Popped {value}");
    }

    println!("Example completed successfully!");
}
