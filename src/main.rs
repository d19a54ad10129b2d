fn main() {
    boss_arena::game::run();
}
